use super::*;
use std::io::Cursor;

#[test]
fn listing_round_trip() {
    let words = vec![0xE1FF, 0x3800, 0x0000, 0xABCD];
    let mut out = Vec::new();
    write_listing(&mut out, &words).unwrap();
    assert_eq!(out, b"E1FF\n3800\n0000\nABCD\n");
    let read = read_listing(&mut Cursor::new(out)).unwrap();
    assert_eq!(read, words);
}

#[test]
fn listing_tolerates_blank_lines() {
    let read = read_listing(&mut Cursor::new(b"E1FF\n\n3800\n".to_vec())).unwrap();
    assert_eq!(read, vec![0xE1FF, 0x3800]);
}

#[test]
fn malformed_lines_are_reported_with_their_number() {
    let result = read_listing(&mut Cursor::new(b"E1FF\nnope\n".to_vec()));
    match result {
        Err(Error::Malformed { line: 2, text }) => assert_eq!(text, "nope"),
        other => panic!("{:?}", other),
    }
}

#[test]
fn short_or_long_words_are_malformed() {
    assert!(read_listing(&mut Cursor::new(b"FFF\n".to_vec())).is_err());
    assert!(read_listing(&mut Cursor::new(b"12345\n".to_vec())).is_err());
}

#[test]
fn raw_round_trip_is_big_endian() {
    let words = vec![0x1234, 0xABCD];
    let mut out = Vec::new();
    write_raw(&mut out, &words).unwrap();
    assert_eq!(out, vec![0x12, 0x34, 0xAB, 0xCD]);
    assert_eq!(read_raw(&mut Cursor::new(out)).unwrap(), words);
}
