//! Two tools sharing the process-wide scene monitor, plus one tool that
//! listens for saves through its own registry.

use std::sync::Arc;

use xmobu_events::{EventCallback, EventRegistry, FileEvent};
use xmobu_scene::{scene_monitor, HostApplication, SceneListener};

fn main() -> anyhow::Result<()> {
    let host = HostApplication::global();
    let monitor = scene_monitor();

    let outliner = SceneListener::new("outliner", |snap| {
        println!(
            "[outliner] {} objects, namespaces {:?}",
            snap.object_count(),
            snap.namespace_list()
        );
        Ok(())
    });
    let mapper = SceneListener::new("character_mapper", |snap| {
        if !snap.has_objects() {
            println!("[mapper] scene is empty, clearing mapping");
        }
        Ok(())
    });
    monitor.add_listener(&outliner);
    monitor.add_listener(&mapper);

    let exporter = EventRegistry::new(host.events());
    exporter.register_file_events(
        &EventCallback::new("exporter.on_save", |_, ctx| {
            println!("[exporter] saved {}", ctx.file_path.as_deref().unwrap_or("<untitled>"));
            Ok(())
        }),
        &[FileEvent::Save],
    );

    host.file_open("C:/shots/sh010.fbx", ["Hero:Hips", "Hero:Spine", "Prop:Sword"]);
    host.add_object("Villain:Hips");
    host.rename_object("Prop:Sword", "Prop:Axe")?;
    host.file_save("C:/shots/sh010.fbx");

    println!(
        "scene info: {}",
        serde_json::to_string(Arc::as_ref(&monitor.get_scene_info()))?
    );

    exporter.unregister_all();
    monitor.remove_listener(&mapper);
    host.file_new();
    Ok(())
}
