//! Integration tests for the message router's addressing rules.

use midi_msg::MidiMsg;
use potlink::app::ports::MessageHandler;
use potlink::chain::message::{MessageKind, RoutedMessage};
use potlink::chain::router::{Router, Source};
use potlink::chain::transport::{NullPort, QueuePort};
use potlink::config::RouterSettings;

type Ports = Router<QueuePort<16>, QueuePort<16>, QueuePort<16>>;

#[derive(Default)]
struct Handled(Vec<MidiMsg>);

impl MessageHandler for Handled {
    fn handle_message(&mut self, msg: &MidiMsg) {
        self.0.push(msg.clone());
    }
}

fn router() -> Ports {
    Router::new(
        QueuePort::new(),
        QueuePort::new(),
        QueuePort::new(),
        RouterSettings::default(),
    )
}

fn msg(address: u8) -> RoutedMessage {
    RoutedMessage::midi_bytes(address, &[0x91, 61, 100]).unwrap()
}

#[test]
fn local_address_zero_dispatches_exactly_once() {
    let mut r = router();
    let mut h = Handled::default();
    r.route(Source::Local, &msg(0), &mut h);
    assert_eq!(h.0.len(), 1);
    assert_eq!(r.downstream_mut().sent_len(), 0);
    assert_eq!(r.upstream_mut().sent_len(), 0);
    assert_eq!(r.local_mut().sent_len(), 0);
}

#[test]
fn every_nonzero_local_address_descends_one_hop() {
    let mut r = router();
    let mut h = Handled::default();
    for a in 1..=14u8 {
        r.route(Source::Local, &msg(a), &mut h);
        let fwd = r.downstream_mut().take_sent().unwrap();
        assert_eq!(fwd.address, a - 1);
        assert_eq!(fwd.payload, msg(a).payload);
    }
    assert!(h.0.is_empty());
}

#[test]
fn every_non_idle_downstream_address_ascends_one_hop() {
    let mut r = router();
    let mut h = Handled::default();
    for a in 0..0x0fu8 {
        r.route(Source::Downstream, &msg(a), &mut h);
        assert_eq!(r.local_mut().take_sent().unwrap().address, a + 1);
    }
    assert_eq!(r.upstream_mut().sent_len(), 0);
    assert!(h.0.is_empty());
}

#[test]
fn idle_address_never_leaves_downstream() {
    let mut r = router();
    let mut h = Handled::default();
    r.route(Source::Downstream, &msg(0x0f), &mut h);
    assert_eq!(r.local_mut().sent_len(), 0);
    assert_eq!(r.upstream_mut().sent_len(), 0);
    assert!(h.0.is_empty());
    assert_eq!(r.stats().dropped_idle, 1);
}

#[test]
fn disconnected_local_suppresses_without_buffering() {
    let mut r = router();
    let mut h = Handled::default();
    r.local_mut().set_connected(false);
    r.route(Source::Downstream, &msg(2), &mut h);
    r.local_mut().set_connected(true);
    r.poll(&mut h);
    assert_eq!(r.local_mut().sent_len(), 0);
    assert_eq!(r.stats().dropped_unready, 1);
}

#[test]
fn upstream_is_treated_as_local_address_zero() {
    let mut r = router();
    let mut h = Handled::default();
    r.upstream_mut().inject(msg(4));
    r.poll(&mut h);
    assert_eq!(h.0.len(), 1);
    assert_eq!(r.downstream_mut().sent_len(), 0);
}

#[test]
fn non_midi_upstream_traffic_is_ignored() {
    let mut r = router();
    let mut h = Handled::default();
    let other = RoutedMessage::other(3, 0, &[0x01]).unwrap();
    assert_eq!(other.kind, MessageKind::Other(3));
    r.route(Source::Upstream, &other, &mut h);
    assert!(h.0.is_empty());
}

#[test]
fn null_downstream_end_of_chain() {
    let mut r: Router<QueuePort<4>, QueuePort<4>, NullPort> = Router::new(
        QueuePort::new(),
        QueuePort::new(),
        NullPort,
        RouterSettings::default(),
    );
    let mut h = Handled::default();
    r.local_mut().inject(msg(1));
    r.poll(&mut h);
    assert!(h.0.is_empty());
    assert!(r.is_idle());
}
