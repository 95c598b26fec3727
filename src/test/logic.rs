use crate::logic::{add, asr, mul, sub};

#[test]
fn add_wraps_and_carries() {
    assert_eq!(add(0xFFFF, 1, false), (0, true, false));
    assert_eq!(add(0xFFFF, 0, true), (0, true, false));
    assert_eq!(add(3, 4, false), (7, false, false));
    assert_eq!(add(3, 4, true), (8, false, false));
}

#[test]
fn add_signed_overflow() {
    assert_eq!(add(0x7FFF, 1, false), (0x8000, false, true));
    assert_eq!(add(0x8000, 0x8000, false), (0, true, true));
    // Mixed signs can never overflow.
    assert_eq!(add(0x8000, 0x7FFF, false), (0xFFFF, false, false));
}

#[test]
fn sub_carry_means_no_borrow() {
    assert_eq!(sub(5, 3, false), (2, true, false));
    assert_eq!(sub(3, 5, false), (0xFFFE, false, false));
    assert_eq!(sub(5, 5, false), (0, true, false));
    assert_eq!(sub(5, 5, true), (0xFFFF, false, false));
}

#[test]
fn sub_zero_edge_cases() {
    // Subtracting zero only borrows when a borrow comes in and a == 0.
    assert_eq!(sub(5, 0, false), (5, true, false));
    assert_eq!(sub(0, 0, false), (0, true, false));
    assert_eq!(sub(0, 0, true), (0xFFFF, false, false));
    assert_eq!(sub(1, 0, true), (0, true, false));
}

#[test]
fn sub_signed_overflow() {
    assert_eq!(sub(0x8000, 1, false), (0x7FFF, true, true));
    assert_eq!(sub(0x7FFF, 0xFFFF, false), (0x8000, false, true));
}

#[test]
fn mul_reports_both_overflows() {
    assert_eq!(mul(3, 4), (12, false, false));
    assert_eq!(mul(0x0100, 0x0100), (0, true, true));
    // -1 * 2 fits signed but overflows unsigned.
    assert_eq!(mul(0xFFFF, 2), (0xFFFE, true, false));
}

#[test]
fn asr_rounds_toward_minus_infinity() {
    assert_eq!(asr(6), 3);
    assert_eq!(asr(7), 3);
    assert_eq!(asr(0xFFFF), 0xFFFF); // -1 >> 1 == -1
    assert_eq!(asr(0xFFFD), 0xFFFE); // -3 >> 1 == -2
    assert_eq!(asr(0x8000), 0xC000);
}
