//! Listeners that call back into the router while a broadcast is in flight
//!
//! A broadcast iterates the listener list it captured before the first
//! callback ran. Changes made from inside a callback only affect later
//! broadcasts, and a nested broadcast has its own result flags.

use crate::{ChannelTag, ListenerHandle, ListenerOptions, MessageRouter};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
struct Alert;

#[derive(Debug, Clone)]
struct Echo;

type Log = Arc<Mutex<Vec<&'static str>>>;

fn push(log: &Log, entry: &'static str) {
    log.lock().unwrap().push(entry);
}

fn take(log: &Log) -> Vec<&'static str> {
    std::mem::take(&mut *log.lock().unwrap())
}

#[test]
fn unregistering_a_later_listener_does_not_skip_others() {
    let router = MessageRouter::new();
    let log: Log = Default::default();
    let channel = ChannelTag::new("Base.Alert");
    let victim: Arc<Mutex<ListenerHandle>> = Default::default();

    {
        let log = log.clone();
        let victim = victim.clone();
        router.register(&channel, ListenerOptions::default().with_priority(0), move |_ctx, _msg: &Alert| {
            push(&log, "remover");
            victim.lock().unwrap().unregister();
        });
    }
    {
        let log = log.clone();
        router.register(&channel, ListenerOptions::default().with_priority(10), move |_ctx, _msg: &Alert| {
            push(&log, "bystander")
        });
    }
    {
        let log = log.clone();
        *victim.lock().unwrap() = router.register(
            &channel,
            ListenerOptions::default().with_priority(20),
            move |_ctx, _msg: &Alert| push(&log, "victim"),
        );
    }
    {
        let log = log.clone();
        router.register(&channel, ListenerOptions::default().with_priority(30), move |_ctx, _msg: &Alert| {
            push(&log, "last")
        });
    }

    router.broadcast(&channel, &mut Alert);
    assert_eq!(take(&log), vec!["remover", "bystander", "victim", "last"]);
    assert_eq!(router.listener_count(), 3);

    router.broadcast(&channel, &mut Alert);
    assert_eq!(take(&log), vec!["remover", "bystander", "last"]);
}

#[test]
fn listener_can_unregister_itself() {
    let router = MessageRouter::new();
    let log: Log = Default::default();
    let channel = ChannelTag::new("Base.Alert");
    let own: Arc<Mutex<ListenerHandle>> = Default::default();

    {
        let log = log.clone();
        let own_in_callback = own.clone();
        *own.lock().unwrap() = router.register(&channel, ListenerOptions::default(), move |_ctx, _msg: &Alert| {
            push(&log, "once");
            own_in_callback.lock().unwrap().unregister();
        });
    }

    router.broadcast(&channel, &mut Alert);
    router.broadcast(&channel, &mut Alert);
    assert_eq!(take(&log), vec!["once"]);
    assert!(!own.lock().unwrap().is_valid());
    assert_eq!(router.listener_count(), 0);
}

#[test]
fn listener_registered_during_broadcast_waits_for_the_next_one() {
    let router = MessageRouter::new();
    let log: Log = Default::default();
    let channel = ChannelTag::new("Base.Alert");

    {
        let log = log.clone();
        let inner_router = router.clone();
        let registered = Arc::new(Mutex::new(false));
        router.register(&channel, ListenerOptions::default().with_priority(0), move |_ctx, _msg: &Alert| {
            push(&log, "spawner");
            let mut registered = registered.lock().unwrap();
            if !*registered {
                *registered = true;
                let log = log.clone();
                inner_router.register(
                    "Base.Alert",
                    ListenerOptions::default().with_priority(100),
                    move |_ctx, _msg: &Alert| push(&log, "spawned"),
                );
            }
        });
    }

    router.broadcast(&channel, &mut Alert);
    assert_eq!(take(&log), vec!["spawner"]);

    router.broadcast(&channel, &mut Alert);
    assert_eq!(take(&log), vec!["spawner", "spawned"]);

    router.reset();
}

#[test]
fn nested_broadcast_has_independent_flags() {
    let router = MessageRouter::new();
    let log: Log = Default::default();
    let alert = ChannelTag::new("Base.Alert");
    let nested_result = Arc::new(Mutex::new(None));

    {
        let log = log.clone();
        router.register("Base.Echo", ListenerOptions::default(), move |ctx, _msg: &Echo| {
            push(&log, "echo");
            ctx.cancel_message(true, true);
        });
    }
    {
        let log = log.clone();
        let inner_router = router.clone();
        let nested_result = nested_result.clone();
        router.register(&alert, ListenerOptions::default().with_priority(0), move |ctx, _msg: &Alert| {
            push(&log, "outer-first");
            let result = inner_router.broadcast(&ChannelTag::new("Base.Echo"), &mut Echo);
            *nested_result.lock().unwrap() = Some(result);
            assert!(!ctx.is_cancelled());
            assert!(!ctx.is_interrupted());
        });
    }
    {
        let log = log.clone();
        router.register(&alert, ListenerOptions::default().with_priority(10), move |_ctx, _msg: &Alert| {
            push(&log, "outer-second")
        });
    }

    let outer = router.broadcast(&alert, &mut Alert);

    assert_eq!(take(&log), vec!["outer-first", "echo", "outer-second"]);
    assert!(!outer.cancelled && !outer.interrupted);
    let nested = nested_result.lock().unwrap().expect("nested broadcast ran");
    assert!(nested.cancelled && nested.interrupted);

    router.reset();
}

#[test]
fn unregister_from_another_thread_during_dispatch() {
    let router = MessageRouter::new();
    let channel = ChannelTag::new("Base.Alert");
    let count = Arc::new(Mutex::new(0u32));

    let mut handle = {
        let count = count.clone();
        router.register(&channel, ListenerOptions::default(), move |_ctx, _msg: &Alert| {
            *count.lock().unwrap() += 1;
        })
    };

    let worker = {
        let router = router.clone();
        let channel = channel.clone();
        std::thread::spawn(move || {
            for _ in 0..100 {
                router.broadcast(&channel, &mut Alert);
            }
        })
    };
    router.unregister(&mut handle);
    worker.join().unwrap();

    let delivered = *count.lock().unwrap();
    router.broadcast(&channel, &mut Alert);
    assert_eq!(*count.lock().unwrap(), delivered);
    assert!(delivered <= 100);
}
