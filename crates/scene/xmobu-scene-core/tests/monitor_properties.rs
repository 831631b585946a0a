use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use xmobu_events::EventHub;
use xmobu_scene::{
    HostApplication, InMemoryScene, MonitorConfig, SceneError, SceneListener, SceneMonitor,
    SceneSnapshot, SceneSource,
};
use xmobu_test_fixtures::{monitor_configs, scenes};

fn monitor_for(host: &HostApplication) -> Arc<SceneMonitor> {
    SceneMonitor::start(host.events(), host.scene(), MonitorConfig::default()).unwrap()
}

fn recording(name: &'static str, log: &Arc<Mutex<Vec<&'static str>>>) -> SceneListener {
    let log = Arc::clone(log);
    SceneListener::new(name, move |_| {
        log.lock().unwrap().push(name);
        Ok(())
    })
}

#[test]
fn namespaces_come_from_prefixed_names_only() {
    let fixture = scenes::load("mixed-namespaces").unwrap();
    let host = HostApplication::new();
    let monitor = monitor_for(&host);

    host.file_open("mixed.fbx", fixture.objects.clone());

    let info = monitor.get_scene_info();
    assert_eq!(info.object_count(), 4);
    assert_eq!(monitor.get_namespaces(), fixture.expected_namespaces);
    assert!(monitor.has_namespace("Character01"));
    assert!(!monitor.has_namespace("Hips"));
}

#[test]
fn every_scene_fixture_matches_its_expected_namespaces() {
    for key in scenes::keys() {
        let fixture = scenes::load(&key).unwrap();
        let host = HostApplication::with_parts(
            Arc::new(EventHub::new()),
            Arc::new(InMemoryScene::with_objects(fixture.objects.clone())),
        );
        let monitor = monitor_for(&host);
        let info = monitor.get_scene_info();
        assert_eq!(info.object_count(), fixture.objects.len(), "{key}");
        assert_eq!(info.has_objects(), !fixture.objects.is_empty(), "{key}");
        assert_eq!(info.namespace_list(), fixture.expected_namespaces, "{key}");
    }
}

#[test]
fn failing_listener_does_not_block_later_listeners() {
    let host = HostApplication::new();
    let monitor = monitor_for(&host);
    let received = Arc::new(AtomicUsize::new(0));

    let a = SceneListener::new("a_errors", |_| anyhow::bail!("widget already deleted"));
    let b = SceneListener::new("b_panics", |_| panic!("index out of range"));
    let counter = Arc::clone(&received);
    let c = SceneListener::new("c_counts", move |snap| {
        counter.fetch_add(snap.object_count(), Ordering::SeqCst);
        Ok(())
    });
    monitor.add_listener(&a);
    monitor.add_listener(&b);
    monitor.add_listener(&c);

    host.add_object("Prop:Box");
    host.add_object("Prop:Lid");
    // c saw counts 1 then 2
    assert_eq!(received.load(Ordering::SeqCst), 3);
    assert_eq!(monitor.get_scene_info().object_count(), 2);
}

#[test]
fn listeners_are_notified_in_insertion_order() {
    let host = HostApplication::new();
    let monitor = monitor_for(&host);
    let log = Arc::new(Mutex::new(Vec::new()));
    let l1 = recording("L1", &log);
    let l2 = recording("L2", &log);
    let l3 = recording("L3", &log);
    monitor.add_listener(&l1);
    monitor.add_listener(&l2);
    monitor.add_listener(&l3);

    host.file_new();
    host.add_object("Hips");
    assert_eq!(*log.lock().unwrap(), vec!["L1", "L2", "L3", "L1", "L2", "L3"]);

    log.lock().unwrap().clear();
    assert!(monitor.remove_listener(&l2));
    host.file_merge("prop.fbx", ["Prop:Box"]);
    assert_eq!(*log.lock().unwrap(), vec!["L1", "L3"]);

    // re-adding goes to the back
    log.lock().unwrap().clear();
    monitor.add_listener(&l2);
    monitor.rescan().unwrap();
    assert_eq!(*log.lock().unwrap(), vec!["L1", "L3", "L2"]);
}

#[test]
fn each_trigger_is_one_pass_with_one_notification() {
    let host = HostApplication::new();
    let monitor = monitor_for(&host);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    monitor.add_listener(&SceneListener::new("gen", move |snap| {
        sink.lock().unwrap().push(snap.generation());
        Ok(())
    }));

    let start = monitor.generation();
    host.file_open("a.fbx", ["A:x"]);
    host.file_merge("b.fbx", ["B:y"]);
    host.add_object("C:z");
    assert_eq!(*seen.lock().unwrap(), vec![start + 1, start + 2, start + 3]);
    assert_eq!(monitor.get_scene_info().generation(), start + 3);
}

#[test]
fn save_is_not_watched_by_default() {
    let host = HostApplication::new();
    let monitor = monitor_for(&host);
    let before = monitor.generation();
    assert_eq!(host.file_save("shot.fbx"), 0);
    assert_eq!(monitor.generation(), before);
}

#[test]
fn structural_filter_skips_selection_changes() {
    let json = monitor_configs::json("structural-only").unwrap();
    let config = MonitorConfig::from_json_str(&json).unwrap();
    let host = HostApplication::new();
    let monitor = SceneMonitor::start(host.events(), host.scene(), config).unwrap();

    let before = monitor.generation();
    host.select_object("Hips");
    assert_eq!(monitor.generation(), before);
    host.add_object("Hips");
    assert_eq!(monitor.generation(), before + 1);

    // without the filter every mutation triggers a pass
    let host = HostApplication::new();
    let monitor = monitor_for(&host);
    let before = monitor.generation();
    host.select_object("Hips");
    assert_eq!(monitor.generation(), before + 1);
}

#[test]
fn save_aware_config_watches_save_but_not_mutations() {
    let json = monitor_configs::json("save-aware").unwrap();
    let config = MonitorConfig::from_json_str(&json).unwrap();
    let host = HostApplication::new();
    let monitor = SceneMonitor::start(host.events(), host.scene(), config).unwrap();

    let before = monitor.generation();
    host.add_object("Hips");
    assert_eq!(monitor.generation(), before);
    host.file_save("shot.fbx");
    assert_eq!(monitor.generation(), before + 1);
    assert_eq!(monitor.get_scene_info().object_count(), 1);
}

#[test]
fn listener_added_during_pass_waits_for_next_pass() {
    let host = HostApplication::new();
    let monitor = monitor_for(&host);
    let late_hits = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&late_hits);
    let late = SceneListener::new("late", move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });
    let weak = Arc::downgrade(&monitor);
    let adder = SceneListener::new("adder", move |_| {
        if let Some(monitor) = weak.upgrade() {
            monitor.add_listener(&late);
        }
        Ok(())
    });
    monitor.add_listener(&adder);

    host.add_object("Hips");
    assert_eq!(late_hits.load(Ordering::SeqCst), 0);
    assert_eq!(monitor.listener_count(), 2);

    host.add_object("Spine");
    assert_eq!(late_hits.load(Ordering::SeqCst), 1);
}

#[test]
fn listener_removed_during_pass_still_runs_this_pass() {
    let host = HostApplication::new();
    let monitor = monitor_for(&host);
    let log = Arc::new(Mutex::new(Vec::new()));
    let second = recording("second", &log);

    let weak = Arc::downgrade(&monitor);
    let victim = second.clone();
    let remover = SceneListener::new("remover", move |_| {
        if let Some(monitor) = weak.upgrade() {
            monitor.remove_listener(&victim);
        }
        Ok(())
    });
    monitor.add_listener(&remover);
    monitor.add_listener(&second);

    host.add_object("Hips");
    assert_eq!(*log.lock().unwrap(), vec!["second"]);
    host.add_object("Spine");
    assert_eq!(*log.lock().unwrap(), vec!["second"]);
}

fn shape(names: &[&str]) -> (usize, BTreeSet<String>) {
    let snap = SceneSnapshot::from_names(names, ':');
    (snap.object_count(), snap.namespaces().clone())
}

#[test]
fn snapshot_never_mixes_two_passes() {
    let host = Arc::new(HostApplication::new());
    let monitor = monitor_for(&host);

    let state_a = ["Character01:Hips", "Character01:Spine", "Prop:Box", "Hips"];
    let state_b = ["Villain:Hips", "Light01"];
    let allowed = vec![shape(&[]), shape(&state_a), shape(&state_b)];

    let writers: Vec<_> = (0..2)
        .map(|i| {
            let host = Arc::clone(&host);
            thread::spawn(move || {
                for n in 0..200 {
                    if (n + i) % 2 == 0 {
                        host.file_open("a.fbx", state_a);
                    } else {
                        host.file_open("b.fbx", state_b);
                    }
                }
            })
        })
        .collect();

    for _ in 0..2000 {
        let info = monitor.get_scene_info();
        let observed = (info.object_count(), info.namespaces().clone());
        assert!(allowed.contains(&observed), "torn snapshot: {observed:?}");
        assert_eq!(info.has_objects(), info.object_count() > 0);
    }
    for w in writers {
        w.join().unwrap();
    }
}

#[test]
fn custom_separator_agrees_with_scene_queries() {
    let host = HostApplication::new();
    let config = MonitorConfig::default().with_separator('|');
    let monitor = SceneMonitor::start(host.events(), host.scene(), config).unwrap();
    host.file_open("rig.fbx", ["rig|Hips", "rig|Spine", "Prop:Box"]);

    let sep = monitor.config().namespace_separator;
    assert_eq!(monitor.get_namespaces(), vec!["rig"]);
    for ns in monitor.get_namespaces() {
        assert!(!host.scene().objects_in_namespace(&ns, sep).is_empty());
    }
    assert!(host.scene().objects_in_namespace("Prop", sep).is_empty());
}

/// Scene whose second enumeration stalls after reading the names.
struct StallingScene {
    objects: InMemoryScene,
    scans: AtomicUsize,
    stalled: Mutex<mpsc::Sender<()>>,
}

impl SceneSource for StallingScene {
    fn object_names(&self) -> Result<Vec<String>, SceneError> {
        let scan = self.scans.fetch_add(1, Ordering::SeqCst) + 1;
        let names = self.objects.object_names()?;
        if scan == 2 {
            let _ = self.stalled.lock().unwrap().send(());
            thread::sleep(Duration::from_millis(200));
        }
        Ok(names)
    }
}

#[test]
fn slow_scan_cannot_overwrite_a_newer_snapshot() {
    let (tx, stalled) = mpsc::channel();
    let scene = Arc::new(StallingScene {
        objects: InMemoryScene::with_objects(["Old:Hips"]),
        scans: AtomicUsize::new(0),
        stalled: Mutex::new(tx),
    });
    let monitor = SceneMonitor::start(
        Arc::new(EventHub::new()),
        scene.clone(),
        MonitorConfig::default(),
    )
    .unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    monitor.add_listener(&SceneListener::new("recorder", move |snap| {
        sink.lock().unwrap().push(snap.namespace_list());
        Ok(())
    }));

    let early = {
        let monitor = Arc::clone(&monitor);
        thread::spawn(move || monitor.rescan().map(|snap| snap.namespace_list()))
    };
    stalled.recv().unwrap();
    scene.objects.replace(["New:Hips"]);
    let latest = monitor.rescan().unwrap();

    assert_eq!(early.join().unwrap().unwrap(), vec!["Old"]);
    assert_eq!(latest.namespace_list(), vec!["New"]);
    assert_eq!(monitor.get_namespaces(), vec!["New"]);
    assert_eq!(monitor.get_scene_info().generation(), 3);
    assert_eq!(seen.lock().unwrap().last(), Some(&vec!["New".to_string()]));
}

#[test]
fn tool_registry_and_monitor_share_one_hub_without_interference() {
    use xmobu_events::{EventCallback, EventRegistry, FileEvent};

    let host = HostApplication::new();
    let monitor = monitor_for(&host);
    let monitor_subs = monitor.registry().subscription_count();

    let saves = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&saves);
    let tool = EventRegistry::new(host.events());
    tool.register_file_events(
        &EventCallback::new("exporter.on_save", move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }),
        &[FileEvent::Save],
    );
    assert_eq!(host.events().total_connections(), monitor_subs + 1);

    host.file_save("shot.fbx");
    assert_eq!(saves.load(Ordering::SeqCst), 1);

    tool.unregister_all();
    assert_eq!(host.events().total_connections(), monitor_subs);

    // the monitor keeps working after the tool tore down
    host.add_object("Prop:Box");
    assert!(monitor.has_namespace("Prop"));
}
