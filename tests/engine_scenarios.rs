//! Black-box integration tests for the concrete scenarios, driven only
//! through `foxtail`'s public API rather than each module's own
//! `#[cfg(test)]` unit tests.

use foxtail::arena::HaRole;
use foxtail::card::mock::MockDigital8;
use foxtail::card::{Card, ChannelMap};
use foxtail::component::gate::{BooleanGate, GateKind};
use foxtail::component::{Component, LatchingComponent, PointRef};
use foxtail::error::{ComponentErr, DigitalErr};
use foxtail::point::database::PointDatabase;
use foxtail::point::scalar::{BoolPoint, Uint32Point, Uint8Point};
use foxtail::point::LockRequest;

#[test]
fn and16_gate_scenario() {
    let mut db = PointDatabase::new(8);
    db.insert(Box::new(BoolPoint::new_valid(0, true, HaRole::General))).unwrap();
    db.insert(Box::new(BoolPoint::new_valid(1, false, HaRole::General))).unwrap();
    db.insert(Box::new(BoolPoint::new_valid(2, true, HaRole::General))).unwrap();
    db.insert(Box::new(BoolPoint::new_invalid(3, HaRole::General))).unwrap(); // q0
    db.insert(Box::new(BoolPoint::new_invalid(4, HaRole::General))).unwrap(); // /q1

    let gate = BooleanGate::new(
        GateKind::And,
        vec![PointRef::new(0), PointRef::new(1), PointRef::new(2)],
        vec![PointRef::new(3), PointRef { id: 4, negate: true, bit: None }],
    )
    .unwrap();
    let mut component: Box<dyn Component> = Box::new(LatchingComponent::new("and16".into(), gate));
    component.resolve_references(&db).unwrap();
    component.start(0).unwrap();
    component.execute(&mut db, 0).unwrap();

    let q0 = db.lookup(3).unwrap().as_any().downcast_ref::<BoolPoint>().unwrap();
    assert_eq!(q0.read(), Some(false));
    let not_q1 = db.lookup(4).unwrap().as_any().downcast_ref::<BoolPoint>().unwrap();
    assert_eq!(not_q1.read(), Some(true));

    db.lookup_mut(1)
        .unwrap()
        .as_any_mut()
        .downcast_mut::<BoolPoint>()
        .unwrap()
        .set_invalid(LockRequest::Noop);
    component.execute(&mut db, 1).unwrap();
    assert_eq!(db.lookup(3).unwrap().as_any().downcast_ref::<BoolPoint>().unwrap().read(), None);
    assert_eq!(db.lookup(4).unwrap().as_any().downcast_ref::<BoolPoint>().unwrap().read(), None);
}

#[test]
fn point_round_trip_scenario() {
    let mut p = Uint32Point::new_invalid(0, HaRole::General);
    p.write(0xB, LockRequest::Lock);
    let json = p.to_json(true);
    assert_eq!(json["val"], serde_json::Value::String("0xB".to_string()));
    assert_eq!(json["locked"], serde_json::Value::Bool(true));

    p.from_json(&serde_json::json!({"id": 0, "val": "0xBB"})).unwrap();
    assert_eq!(p.read(), Some(0xB));

    p.from_json(&serde_json::json!({"id": 0, "val": "0xBB", "locked": false})).unwrap();
    assert_eq!(p.read(), Some(0xBB));
    assert!(!p.is_locked());
}

#[test]
fn card_start_scan_flush_scenario() {
    let mut db = PointDatabase::new(8);
    db.insert(Box::new(Uint8Point::new_valid(1, 128, HaRole::General))).unwrap();
    db.insert(Box::new(Uint8Point::new_valid(2, 128, HaRole::CardStateful))).unwrap();
    db.insert(Box::new(Uint8Point::new_invalid(3, HaRole::General))).unwrap();
    db.insert(Box::new(Uint8Point::new_invalid(4, HaRole::CardStateful))).unwrap();

    let mut card = MockDigital8::new(
        0,
        "digital8".into(),
        vec![ChannelMap { channel: 1, point_id: 1, io_reg_id: 2 }],
        vec![ChannelMap { channel: 1, point_id: 3, io_reg_id: 4 }],
    )
    .unwrap();

    card.start(&mut db).unwrap();
    card.scan_inputs(&mut db).unwrap();
    assert_eq!(db.lookup(1).unwrap().as_any().downcast_ref::<Uint8Point>().unwrap().read(), Some(128));

    card.invalidate_input_register(&mut db, 1).unwrap();
    card.scan_inputs(&mut db).unwrap();
    assert_eq!(db.lookup(1).unwrap().as_any().downcast_ref::<Uint8Point>().unwrap().read(), None);

    db.lookup_mut(3).unwrap().as_any_mut().downcast_mut::<Uint8Point>().unwrap().write(32, LockRequest::Noop);
    card.flush_outputs(&mut db).unwrap();
    assert_eq!(card.read_output_register(&db, 1).unwrap(), Some(32));
}

#[test]
fn error_encoding_scenario() {
    let e = DigitalErr::DemuxInvalidBitOffset.full();
    assert_eq!(e.to_text(), "COMPONENT:DIGITAL:DEMUX_INVALID_BIT_OFFSET");
    let _ = ComponentErr::UnknownGuid.full(); // sanity: category also reachable one level up
}

#[test]
fn node_rejects_zero_chassis() {
    let err = foxtail::node::Node::build(&serde_json::json!({"fxtNode": {"chassis": []}})).unwrap_err();
    assert_eq!(err.to_text(), "NODE:NO_CHASSIS");
}

#[test]
fn node_rejects_document_missing_fxt_node_envelope() {
    let err = foxtail::node::Node::build(&serde_json::json!({"chassis": []})).unwrap_err();
    assert_eq!(err.to_text(), "NODE:PARSE_ERROR");
}
