//! Async streams used from tasks
//!
//! A game-flow task waits for the round to end while another task drives
//! broadcasts. The stream must see exactly what a callback listener with the
//! same options would see.

use crate::{
    ChannelTag, ListenerOptions, MessageContext, MessagePriority, MessageRouter, MessageType,
    Payload, SpatialMessageRouter, TargetId, Vec3,
};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
struct RoundEnded {
    winner: u8,
}

#[tokio::test]
async fn task_waits_for_broadcast_from_another_task() {
    let router = MessageRouter::new();
    let mut rounds = router.listen::<RoundEnded>("Match.Round", ListenerOptions::default());

    let sender = router.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        sender.broadcast(&ChannelTag::new("Match.Round"), &mut RoundEnded { winner: 2 });
    });

    let received = tokio::time::timeout(Duration::from_secs(5), rounds.recv())
        .await
        .expect("round should end")
        .expect("stream open");
    assert_eq!(received.payload, RoundEnded { winner: 2 });
    assert_eq!(received.origin, None);
}

#[tokio::test]
async fn stream_sees_overridden_payload_and_respects_interrupts() {
    let router = MessageRouter::new();
    let channel = ChannelTag::new("Match.Round");

    router.register_raw(
        &MessageType::of::<RoundEnded>(),
        &channel,
        ListenerOptions::default().with_priority(MessagePriority::Highest),
        Arc::new(|ctx: &mut MessageContext<'_>, payload: &mut Payload<'_>| {
            let winner = payload.get::<RoundEnded>().map_or(0, |r| r.winner);
            if winner == 0 {
                ctx.cancel_message(true, true);
            } else {
                payload.override_with(RoundEnded { winner: winner + 10 });
            }
        }),
    );
    let mut rounds = router.listen::<RoundEnded>(
        &channel,
        ListenerOptions::default().with_priority(MessagePriority::Monitor),
    );

    router.broadcast(&channel, &mut RoundEnded { winner: 0 });
    router.broadcast(&channel, &mut RoundEnded { winner: 1 });

    assert_eq!(rounds.recv().await.map(|m| m.payload.winner), Some(11));
    assert!(rounds.try_recv().is_none());
}

#[tokio::test]
async fn targeted_stream_only_receives_its_target() {
    let router = MessageRouter::new();
    let channel = ChannelTag::new("Match.Round");
    let team = TargetId::new();
    let mut team_rounds =
        router.listen::<RoundEnded>(&channel, ListenerOptions::default().with_target(team));

    router.broadcast(&channel, &mut RoundEnded { winner: 1 });
    router.broadcast_to(&channel, &mut RoundEnded { winner: 2 }, TargetId::new());
    router.broadcast_to(&channel, &mut RoundEnded { winner: 3 }, team);

    let received = team_rounds.next().await.expect("targeted round");
    assert_eq!(received.payload.winner, 3);
    assert_eq!(received.target, Some(team));
    assert!(team_rounds.try_recv().is_none());
}

#[tokio::test]
async fn spatial_stream_follows_handle_moves() {
    let router = SpatialMessageRouter::new();
    let channel = ChannelTag::new("Match.Round");
    let mut nearby = router.listen_at::<RoundEnded>(
        &channel,
        Vec3::new(8.0, 8.0, 0.0),
        4.0,
        ListenerOptions::default(),
    );

    assert!(router.update_location(nearby.handle(), Vec3::new(300.0, 8.0, 0.0), None));
    router.broadcast_at(&channel, &mut RoundEnded { winner: 1 }, Vec3::new(8.0, 8.0, 0.0));
    router.broadcast_at(&channel, &mut RoundEnded { winner: 2 }, Vec3::new(301.0, 8.0, 0.0));

    assert_eq!(nearby.recv().await.map(|m| m.payload.winner), Some(2));
    assert!(nearby.try_recv().is_none());

    drop(nearby);
    assert_eq!(router.listener_count(), 0);
    assert_eq!(router.cell_count(), 0);
}
