use libxwin::prelude::*;

fn main() -> WindowResult<()> {
    let wm = WindowManager::connect()?;
    let size = wm.desktop_size()?;
    println!("X11 Information");
    println!("{:-<72}", "");
    println!("Window Manager:    {}", wm.name());
    println!("Root Window:       {}", wm.root());
    println!("Desktop Size:      {}x{}", size.width, size.height);
    println!("Work area:         {}", wm.workarea_geometry()?);
    println!("Desktops:          {}", wm.desktops()?);
    println!();
    println!("Active Window");
    println!("{:-<72}", "");

    let win = wm.active_window()?;
    let types = win.types()?.iter().map(|x| x.to_string()).collect::<Vec<_>>();
    let states = win.state()?.iter().map(|x| x.to_string()).collect::<Vec<_>>();
    println!("Id:                0x{:08x}", win.id);
    println!("Name:              {}", win.name()?);
    println!("Class:             {}", win.class_name()?);
    println!("Desktop:           {}", win.desktop()?);
    println!("Type:              {}", types.join(", "));
    println!("State:             {}", states.join(", "));
    println!("Geometry:          {}", win.geometry()?);
    println!("Borders:           {}", win.borders()?);
    println!("Size Hints:        {:?}", win.size_hints()?);
    Ok(())
}
