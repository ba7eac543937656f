//! Stream transform tests.

mod property_test;

use git_invoke::stream::{line_stream, read_tail, LineReconstructor, TailBuffer};

#[tokio::test]
async fn line_stream_over_progress_output() {
    use futures_util::StreamExt;

    let reader = tokio_test::io::Builder::new()
        .read(b"Cloning into 'repo'...\n")
        .read(b"Receiving objects:  33% (1/3)\rReceiving objects:  66% (2/3)\r")
        .read(b"Receiving objects: 100% (3/3), done.\n")
        .build();

    let lines: Vec<String> = line_stream(reader, LineReconstructor::default())
        .map(|line| String::from_utf8(line.unwrap()).unwrap())
        .collect()
        .await;

    assert_eq!(
        lines,
        vec![
            "Cloning into 'repo'...\n".to_string(),
            "Receiving objects: 100% (3/3), done.\n".to_string(),
        ]
    );
}

#[tokio::test]
async fn read_tail_of_long_stream() {
    let mut builder = tokio_test::io::Builder::new();
    for _ in 0..100 {
        builder.read(b"0123456789");
    }
    let tail = read_tail(builder.build(), TailBuffer::try_new(15).unwrap())
        .await
        .unwrap();
    assert_eq!(tail, b"567890123456789");
}
