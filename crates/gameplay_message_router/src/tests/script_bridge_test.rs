//! Script-defined message types crossing into Rust listeners and back

use crate::{
    ChannelTag, ListenerOptions, MessagePriority, MessageRouter, MessageType, RouterError,
    SpatialMessageRouter, Vec3,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct QuestCompleted {
    quest: String,
    xp: u32,
}

#[test]
fn script_listeners_edit_payload_in_place() {
    let router = MessageRouter::new();
    let quest_completed = MessageType::dynamic("QuestCompleted");
    let channel = ChannelTag::new("Quest.Completed");
    let seen = Arc::new(Mutex::new(Vec::new()));

    router
        .register_script(
            &quest_completed,
            "Quest",
            ListenerOptions::partial().with_priority(MessagePriority::Higher),
            |_ctx, value: &mut Value| {
                if let Some(xp) = value.get("xp").and_then(Value::as_u64) {
                    value["xp"] = json!(xp * 2);
                }
            },
        )
        .expect("dynamic type");
    {
        let seen = seen.clone();
        router
            .register_script(&quest_completed, &channel, ListenerOptions::default(), move |_ctx, value| {
                seen.lock().unwrap().push(value.clone());
            })
            .expect("dynamic type");
    }

    let mut payload = json!({ "quest": "rescue", "xp": 50 });
    let result = router
        .broadcast_script(&channel, &quest_completed, &mut payload, None)
        .expect("dynamic type");

    assert!(!result.cancelled);
    assert_eq!(payload["xp"], json!(100));
    assert_eq!(seen.lock().unwrap().clone(), vec![json!({ "quest": "rescue", "xp": 100 })]);
    assert_eq!(router.listener_count_for(&quest_completed), 2);
}

#[test]
fn raw_listener_reads_json_into_rust_type() {
    let router = MessageRouter::new();
    let quest_completed = MessageType::dynamic("QuestCompleted");
    let channel = ChannelTag::new("Quest.Completed");
    let decoded = Arc::new(Mutex::new(None));

    {
        let decoded = decoded.clone();
        router.register_raw(
            &quest_completed,
            &channel,
            ListenerOptions::default(),
            Arc::new(move |_ctx: &mut crate::MessageContext<'_>, payload: &mut crate::Payload<'_>| {
                *decoded.lock().unwrap() = payload.read_json::<QuestCompleted>().ok();
                let bonus = QuestCompleted {
                    quest: "rescue".to_string(),
                    xp: 999,
                };
                assert!(payload.override_json(&bonus).is_ok());
            }),
        );
    }

    let mut payload = json!({ "quest": "rescue", "xp": 50 });
    router
        .broadcast_script(&channel, &quest_completed, &mut payload, None)
        .expect("dynamic type");

    assert_eq!(
        decoded.lock().unwrap().clone(),
        Some(QuestCompleted {
            quest: "rescue".to_string(),
            xp: 50
        })
    );
    assert_eq!(payload, json!({ "quest": "rescue", "xp": 999 }));
}

#[test]
fn two_dynamic_types_with_one_name_do_not_mix() {
    let router = MessageRouter::new();
    let first = MessageType::dynamic("Reload");
    let second = MessageType::dynamic("Reload");
    let hits = Arc::new(Mutex::new(0u32));

    {
        let hits = hits.clone();
        router
            .register_script(&first, "Scripts", ListenerOptions::partial(), move |_ctx, _value| {
                *hits.lock().unwrap() += 1;
            })
            .expect("dynamic type");
    }

    router
        .broadcast_script(&ChannelTag::new("Scripts.Reload"), &second, &mut json!(null), None)
        .expect("dynamic type");
    assert_eq!(*hits.lock().unwrap(), 0);

    router
        .broadcast_script(&ChannelTag::new("Scripts.Reload"), &first, &mut json!(null), None)
        .expect("dynamic type");
    assert_eq!(*hits.lock().unwrap(), 1);
}

#[test]
fn unloading_a_script_type_purges_its_listeners() {
    let router = MessageRouter::new();
    let hot_reloaded = MessageType::dynamic("HotReloaded");
    let keeper = MessageType::dynamic("Keeper");

    router
        .register_script(&hot_reloaded, "Scripts", ListenerOptions::partial(), |_ctx, _value| {})
        .expect("dynamic type");
    router
        .register_script(&keeper, "Scripts", ListenerOptions::partial(), |_ctx, _value| {})
        .expect("dynamic type");
    assert_eq!(router.listener_count(), 2);

    // The descriptor stays allocated but is retired for every holder
    let still_held = hot_reloaded.clone();
    hot_reloaded.retire();

    let result = router.broadcast_script(&ChannelTag::new("Scripts"), &still_held, &mut json!({}), None);
    assert!(matches!(result, Err(RouterError::StaleMessageType(_))));

    // A dispatch over the keeper's list does not touch other types
    router
        .broadcast_script(&ChannelTag::new("Scripts"), &keeper, &mut json!({}), None)
        .expect("dynamic type");
    assert_eq!(router.listener_count(), 2);

    // Raw broadcasts skip the scripting checks and reach the stale entry
    router.broadcast_raw(&ChannelTag::new("Scripts"), &still_held, &mut json!({}), None);
    assert_eq!(router.listener_count(), 1);
    assert_eq!(router.stats().stale_listeners_purged, 1);
}

#[test]
fn spatial_script_broadcasts() {
    let router = SpatialMessageRouter::new();
    let explosion = MessageType::dynamic("Explosion");
    let heard = Arc::new(Mutex::new(Vec::new()));

    {
        let heard = heard.clone();
        router
            .register_script_at(
                &explosion,
                "World",
                Vec3::new(8.0, 8.0, 0.0),
                6.0,
                ListenerOptions::partial(),
                move |ctx, value| {
                    heard.lock().unwrap().push((ctx.origin(), value["size"].clone()));
                },
            )
            .expect("dynamic type");
    }

    let channel = ChannelTag::new("World.Explosion");
    router
        .broadcast_script_at(&channel, &explosion, &mut json!({ "size": 3 }), Vec3::new(10.0, 8.0, 0.0), None)
        .expect("dynamic type");
    router
        .broadcast_script_at(&channel, &explosion, &mut json!({ "size": 9 }), Vec3::new(90.0, 8.0, 0.0), None)
        .expect("dynamic type");

    assert_eq!(
        heard.lock().unwrap().clone(),
        vec![(Some(Vec3::new(10.0, 8.0, 0.0)), json!(3))]
    );

    let native = router.broadcast_script_at(
        &channel,
        &MessageType::of::<QuestCompleted>(),
        &mut json!({}),
        Vec3::zero(),
        None,
    );
    assert!(matches!(native, Err(RouterError::TypeMismatch { .. })));
}
