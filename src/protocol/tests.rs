// test-only module included via protocol/mod.rs
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use crate::core::frame::{OutboundMessage, ParsedFrame};
use crate::protocol::dispatcher::Dispatcher;
use crate::protocol::message::{codes, Transaction};

fn inbound(code: &str, fields: &str, seq: char) -> ParsedFrame {
    let wire = OutboundMessage::new(code, fields, seq).encode().unwrap();
    ParsedFrame::parse(&wire).unwrap()
}

#[test]
fn test_login_maps_to_success_response() {
    let dispatcher = Dispatcher::with_builtin_handlers().unwrap();
    let frame = inbound(codes::LOGIN_REQUEST, "BNlibuser|COsecret|", '4');

    let response = dispatcher.dispatch(&frame).unwrap().expect("login handled");
    assert_eq!(response.code, codes::LOGIN_RESPONSE);
    assert_eq!(response.fields, "1");
    assert_eq!(response.sequence, '4');
}

#[test]
fn test_checkout_and_checkin_map_to_success() {
    let dispatcher = Dispatcher::with_builtin_handlers().unwrap();

    let checkout = inbound(codes::CHECKOUT_REQUEST, "AApatron123|ABitem456|", '2');
    let response = dispatcher.dispatch(&checkout).unwrap().unwrap();
    assert_eq!(response.code, codes::CHECKOUT_RESPONSE);
    assert_eq!(response.fields, "1");
    assert_eq!(response.sequence, '2');

    let checkin = inbound(codes::CHECKIN_REQUEST, "ABitem456|", '3');
    let response = dispatcher.dispatch(&checkin).unwrap().unwrap();
    assert_eq!(response.code, codes::CHECKIN_RESPONSE);
    assert_eq!(response.fields, "1");
    assert_eq!(response.sequence, '3');
}

#[test]
fn test_patron_status_echoes_identifier() {
    let dispatcher = Dispatcher::with_builtin_handlers().unwrap();
    let frame = inbound(codes::PATRON_STATUS_REQUEST, "AA12345|", '7');

    let response = dispatcher.dispatch(&frame).unwrap().unwrap();
    assert_eq!(response.code, codes::PATRON_STATUS_RESPONSE);
    assert!(response.fields.contains("AA12345|"));
    assert!(response.fields.contains("NIName, My Patron|"));
    assert_eq!(response.sequence, '7');
}

#[test]
fn test_patron_status_without_identifier_echoes_empty_group() {
    let dispatcher = Dispatcher::with_builtin_handlers().unwrap();
    let frame = inbound(codes::PATRON_STATUS_REQUEST, "BLinstitution|", '1');

    let response = dispatcher.dispatch(&frame).unwrap().unwrap();
    assert!(response.fields.ends_with("AA|"));
}

#[test]
fn test_unknown_code_yields_silence() {
    let dispatcher = Dispatcher::with_builtin_handlers().unwrap();
    let frame = inbound("99", "AOinstitution|", '0');

    assert!(dispatcher.dispatch(&frame).unwrap().is_none());
}

#[test]
fn test_register_overrides_builtin_handler() {
    let dispatcher = Dispatcher::with_builtin_handlers().unwrap();
    dispatcher
        .register(codes::LOGIN_REQUEST, |frame| {
            Ok(OutboundMessage::new(
                codes::LOGIN_RESPONSE,
                "0",
                frame.sequence(),
            ))
        })
        .unwrap();

    let frame = inbound(codes::LOGIN_REQUEST, "BNlibuser|COsecret|", '5');
    let response = dispatcher.dispatch(&frame).unwrap().unwrap();
    assert_eq!(response.fields, "0");
}

#[test]
fn test_empty_dispatcher_handles_nothing() {
    let dispatcher = Dispatcher::new();
    let frame = inbound(codes::LOGIN_REQUEST, "", '0');
    assert!(dispatcher.dispatch(&frame).unwrap().is_none());
}

#[test]
fn test_transaction_code_table_is_consistent() {
    for transaction in Transaction::ALL {
        assert_eq!(
            Transaction::from_request_code(transaction.request_code()),
            Some(transaction)
        );
        assert_ne!(transaction.request_code(), transaction.response_code());
        assert!(!transaction.name().is_empty());
    }
    assert_eq!(Transaction::from_request_code("00"), None);
}
