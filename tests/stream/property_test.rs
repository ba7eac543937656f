//! Chunk-boundary independence of the stream transforms.

use git_invoke::stream::{LineReconstructor, TailBuffer};
use proptest::prelude::*;

fn split(input: &[u8], cuts: &[usize]) -> Vec<Vec<u8>> {
    let mut chunks = Vec::new();
    let mut rest = input;
    for &cut in cuts {
        if rest.is_empty() {
            break;
        }
        let (head, tail) = rest.split_at(cut.min(rest.len()));
        chunks.push(head.to_vec());
        rest = tail;
    }
    chunks.push(rest.to_vec());
    chunks
}

fn reconstruct(capacity: usize, chunks: &[Vec<u8>]) -> Vec<Vec<u8>> {
    let mut lines = LineReconstructor::try_new(capacity).unwrap();
    let mut out = Vec::new();
    for chunk in chunks {
        out.extend(lines.push(chunk));
    }
    out.extend(lines.flush());
    out
}

fn terminal_bytes() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(
        prop_oneof![
            4 => b'a'..=b'z',
            1 => Just(b'\n'),
            1 => Just(b'\r'),
        ],
        0..512,
    )
}

proptest! {
    #[test]
    fn lines_independent_of_chunking(
        input in terminal_bytes(),
        cuts in prop::collection::vec(1usize..64, 0..32),
        capacity in 1usize..32,
    ) {
        let whole = reconstruct(capacity, &[input.clone()]);
        let chunked = reconstruct(capacity, &split(&input, &cuts));
        prop_assert_eq!(whole, chunked);
    }

    #[test]
    fn lines_never_exceed_capacity(
        input in terminal_bytes(),
        capacity in 1usize..32,
    ) {
        for line in reconstruct(capacity, &[input]) {
            prop_assert!(line.len() <= capacity);
        }
    }

    #[test]
    fn lines_without_carriage_return_preserve_bytes(
        input in prop::collection::vec(prop_oneof![b'a'..=b'z', Just(b'\n')], 0..512),
        cuts in prop::collection::vec(1usize..64, 0..32),
        capacity in 1usize..32,
    ) {
        let lines = reconstruct(capacity, &split(&input, &cuts));
        prop_assert_eq!(lines.concat(), input);
    }

    #[test]
    fn tail_is_suffix_of_input(
        input in prop::collection::vec(any::<u8>(), 0..512),
        cuts in prop::collection::vec(1usize..64, 0..32),
        capacity in 1usize..128,
    ) {
        let mut tail = TailBuffer::try_new(capacity).unwrap();
        for chunk in split(&input, &cuts) {
            tail.push(&chunk);
            prop_assert!(tail.len() <= capacity);
        }
        let expected = &input[input.len().saturating_sub(capacity)..];
        prop_assert_eq!(tail.finish().unwrap_or_default(), expected.to_vec());
    }
}
