use solfege::lookahead::LookaheadBuffer;

#[test]
fn fills_before_evicting() {
    let mut buffer: LookaheadBuffer<i32, 2> = LookaheadBuffer::new();
    assert!(buffer.is_empty());
    assert_eq!(buffer.push(1), None);
    assert_eq!(buffer.push(2), None);
    assert!(buffer.is_full());
    assert_eq!(buffer.push(3), Some(1));
    assert_eq!(buffer.push(4), Some(2));
    assert_eq!(buffer[0], 3);
    assert_eq!(buffer[1], 4);
}

#[test]
fn lookups_do_not_wrap() {
    let mut buffer: LookaheadBuffer<&str, 3> = LookaheadBuffer::new();
    buffer.push("a");
    buffer.push("b");
    assert_eq!(buffer.get(1), Some(&"b"));
    assert_eq!(buffer.get(2), None);
    assert_eq!(buffer.get(5), None);
    assert_eq!(buffer.capacity(), 3);
    assert_eq!(buffer.len(), 2);
}

#[test]
#[should_panic(expected = "out of range")]
fn indexing_past_filled_length_panics() {
    let mut buffer: LookaheadBuffer<u8, 4> = LookaheadBuffer::new();
    buffer.push(7);
    let _ = buffer[1];
}

#[test]
fn pop_and_clear() {
    let mut buffer: LookaheadBuffer<char, 2> = LookaheadBuffer::default();
    buffer.push('x');
    buffer.push('y');
    buffer.push('z');
    assert_eq!(buffer.head(), Some(&'y'));
    assert_eq!(buffer.pop(), Some('y'));
    assert_eq!(buffer.len(), 1);
    assert_eq!(buffer.push('w'), None);
    assert_eq!(buffer.get(1), Some(&'w'));
    buffer.clear();
    assert!(buffer.is_empty());
    assert_eq!(buffer.pop(), None);
}
