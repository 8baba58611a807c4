use mmctester::commands::{Command, LedFunction, SetFruLedState};
use mmctester::{Error, RawResponse};

#[test]
fn set_fru_led_state_encodes_presets() {
    let cases = [
        (LedFunction::Off, [0x00, 0x00]),
        (LedFunction::On, [0xFF, 0x00]),
        (LedFunction::ShortBlink, [0x5A, 0x0A]),
        (LedFunction::LongBlink, [0x0A, 0x5A]),
        (LedFunction::Blink { off: 0x10, on: 0x20 }, [0x10, 0x20]),
    ];

    for (function, [led_function, on_duration]) in cases {
        let cmd = SetFruLedState::hot_swap_led(function);
        assert_eq!(
            cmd.request_data(),
            vec![0x00, 0x00, 0x00, led_function, on_duration, 0x0F]
        );
    }
}

#[test]
fn set_fru_led_state_masks_color() {
    let cmd = SetFruLedState {
        fru_id: 1,
        led_id: 2,
        function: LedFunction::On,
        color: 0xF3,
    };
    assert_eq!(cmd.request_data(), vec![0x00, 0x01, 0x02, 0xFF, 0x00, 0x03]);
}

#[test]
fn set_fru_led_state_checks_picmg_identifier() {
    let cmd = SetFruLedState::hot_swap_led(LedFunction::Off);

    let ok = RawResponse {
        completion_code: 0x00,
        data: vec![0x00],
    };
    cmd.parse_response(ok).expect("parse");

    let missing = RawResponse {
        completion_code: 0x00,
        data: Vec::new(),
    };
    assert!(matches!(
        cmd.parse_response(missing),
        Err(Error::MalformedFrame(_))
    ));
}

#[test]
fn completion_code_is_reported() {
    let response = RawResponse {
        completion_code: 0xCC,
        data: vec![0x00],
    };

    let err = SetFruLedState::hot_swap_led(LedFunction::On)
        .parse_response(response)
        .expect_err("expected error");
    assert!(matches!(
        err,
        Error::CompletionCode {
            completion_code: 0xCC
        }
    ));
}
