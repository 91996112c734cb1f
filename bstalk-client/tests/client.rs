use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

use bstalk_client::{Client, ClientConfig, ClientError, LastError, StatsValue};

/// One command as received by the fake server.
struct Received {
    line: String,
    body: Option<Vec<u8>>,
}

fn spawn_server(
    expected_commands: usize,
    handler: fn(usize, Received, &mut TcpStream),
) -> (String, thread::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr").to_string();

    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept");
        let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
        let mut reader = BufReader::new(stream.try_clone().expect("clone"));
        for idx in 0..expected_commands {
            let received = read_command(&mut reader).expect("read command");
            handler(idx, received, &mut stream);
        }
    });

    (addr, handle)
}

fn read_command(reader: &mut BufReader<TcpStream>) -> std::io::Result<Received> {
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Err(std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "eof"));
    }
    let line = line
        .strip_suffix("\r\n")
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::InvalidData, "missing crlf"))?
        .to_string();

    let body = if line.starts_with("put ") {
        let len: usize = line
            .rsplit(' ')
            .next()
            .and_then(|len| len.parse().ok())
            .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::InvalidData, "length"))?;
        let mut data = vec![0u8; len];
        reader.read_exact(&mut data)?;
        let mut crlf = [0u8; 2];
        reader.read_exact(&mut crlf)?;
        if crlf != [b'\r', b'\n'] {
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidData, "missing crlf"));
        }
        Some(data)
    } else {
        None
    };

    Ok(Received { line, body })
}

fn write_line(stream: &mut TcpStream, line: &str) {
    let _ = stream.write_all(line.as_bytes());
    let _ = stream.write_all(b"\r\n");
    let _ = stream.flush();
}

fn write_with_body(stream: &mut TcpStream, header: &str, body: &[u8]) {
    let _ = stream.write_all(format!("{} {}\r\n", header, body.len()).as_bytes());
    let _ = stream.write_all(body);
    let _ = stream.write_all(b"\r\n");
    let _ = stream.flush();
}

fn client_with_addr(addr: String) -> Client {
    let config = ClientConfig {
        addr,
        read_timeout: Some(Duration::from_secs(1)),
        write_timeout: Some(Duration::from_secs(1)),
        ..ClientConfig::default()
    };
    let mut client = Client::new(config);
    client.connect().expect("connect");
    client
}

#[test]
fn client_put_reserve_delete_roundtrip() {
    let (addr, server) = spawn_server(4, |idx, received, stream| match idx {
        0 => {
            assert_eq!(received.line, "use emails");
            write_line(stream, "USING emails");
        }
        1 => {
            assert_eq!(received.line, "put 60 0 30 9");
            assert_eq!(received.body.as_deref(), Some(&b"line\r\nend"[..]));
            write_line(stream, "INSERTED 5");
        }
        2 => {
            assert_eq!(received.line, "reserve");
            write_with_body(stream, "RESERVED 5", b"line\r\nend");
        }
        _ => {
            assert_eq!(received.line, "delete 5");
            write_line(stream, "DELETED");
        }
    });

    let mut client = client_with_addr(addr);
    client.use_tube("emails").expect("use");
    let id = client.put(b"line\r\nend").expect("put");
    assert_eq!(id, 5);
    let job = client.reserve().expect("reserve");
    assert_eq!(job.id, 5);
    assert_eq!(&job.body[..], b"line\r\nend");
    client.delete(job.id).expect("delete");
    server.join().expect("server");
}

#[test]
fn client_stats_and_tube_lists() {
    let (addr, server) = spawn_server(3, |idx, received, stream| match idx {
        0 => {
            assert_eq!(received.line, "stats");
            write_with_body(
                stream,
                "OK",
                b"---\ncurrent-jobs-ready: 4\nrusage-utime: 0.012\nversion: 1.13\nhostname: q1\n",
            );
        }
        1 => {
            assert_eq!(received.line, "list-tubes");
            write_with_body(stream, "OK", b"---\n- default\n- emails\n");
        }
        _ => {
            assert_eq!(received.line, "stats-job 77");
            write_line(stream, "NOT_FOUND");
        }
    });

    let mut client = client_with_addr(addr);
    let stats = client.stats().expect("stats");
    assert_eq!(stats.get("current-jobs-ready"), Some(&StatsValue::Int(4)));
    assert_eq!(stats.get("rusage-utime"), Some(&StatsValue::Float(0.012)));
    assert_eq!(stats.get("hostname").and_then(StatsValue::as_str), Some("q1"));
    let json = serde_json::to_value(&stats).expect("json");
    assert_eq!(json["current-jobs-ready"], 4);
    assert_eq!(json["version"], 1.13);

    let tubes = client.list_tubes().expect("list-tubes");
    assert_eq!(tubes, ["default", "emails"]);

    let err = client.stats_job(77).unwrap_err();
    assert_eq!(err.status(), Some("NOT_FOUND"));
    assert_eq!(
        client.take_last_error(),
        Some(LastError {
            status: "NOT_FOUND".to_string(),
            message: String::new(),
        })
    );
    server.join().expect("server");
}

#[test]
fn client_watch_ignore_against_server() {
    let (addr, server) = spawn_server(3, |idx, received, stream| match idx {
        0 => {
            assert_eq!(received.line, "watch emails");
            write_line(stream, "WATCHING 2");
        }
        1 => {
            assert_eq!(received.line, "ignore default");
            write_line(stream, "WATCHING 1");
        }
        _ => {
            assert_eq!(received.line, "list-tubes-watched");
            write_with_body(stream, "OK", b"---\n- emails\n");
        }
    });

    let mut client = client_with_addr(addr);
    assert_eq!(client.watch("emails").expect("watch"), 2);
    assert_eq!(client.watch("emails").expect("cached watch"), 2);
    assert_eq!(client.ignore("default").expect("ignore"), 1);
    assert!(matches!(
        client.ignore("emails"),
        Err(ClientError::LastWatchedTube(_))
    ));
    assert_eq!(client.list_tubes_watched(true).expect("watched"), ["emails"]);
    server.join().expect("server");
}

#[test]
fn client_disconnect_sends_quit() {
    let (addr, server) = spawn_server(1, |_, received, _| {
        assert_eq!(received.line, "quit");
    });

    let mut client = client_with_addr(addr);
    client.disconnect();
    assert!(!client.is_connected());
    assert!(matches!(client.touch(1), Err(ClientError::NotConnected)));
    server.join().expect("server");
}

#[test]
fn client_server_hangup_is_connectivity_error() {
    let (addr, server) = spawn_server(1, |_, received, stream| {
        assert_eq!(received.line, "kick 5");
        let _ = stream.shutdown(std::net::Shutdown::Both);
    });

    let mut client = client_with_addr(addr);
    let err = client.kick(5).unwrap_err();
    assert!(err.is_connectivity(), "unexpected error: {err}");
    assert!(!client.is_connected());
    assert_eq!(client.take_last_error(), None);
    server.join().expect("server");
}

#[test]
fn client_refuses_overflowing_body_length() {
    let (addr, server) = spawn_server(1, |_, received, stream| {
        assert_eq!(received.line, "stats");
        write_line(stream, "OK 18446744073709551615");
    });

    let mut client = client_with_addr(addr);
    let err = client.stats().unwrap_err();
    match &err {
        ClientError::Io(io) => assert_eq!(io.kind(), std::io::ErrorKind::InvalidData),
        other => panic!("unexpected error: {other}"),
    }
    assert!(!client.is_connected());
    assert_eq!(client.take_last_error(), None);
    server.join().expect("server");
}

#[test]
fn client_enforces_configured_body_limit() {
    let (addr, server) = spawn_server(1, |_, received, stream| {
        assert_eq!(received.line, "peek 3");
        write_line(stream, "FOUND 3 4096");
    });

    let config = ClientConfig {
        addr,
        read_timeout: Some(Duration::from_secs(1)),
        max_body_len: 1024,
        ..ClientConfig::default()
    };
    let mut client = Client::new(config);
    client.connect().expect("connect");
    let err = client.peek(3).unwrap_err();
    assert!(matches!(&err, ClientError::Io(io) if io.kind() == std::io::ErrorKind::InvalidData));
    assert!(!client.is_connected());
    server.join().expect("server");
}

#[test]
fn client_read_timeout_surfaces_as_io_error() {
    let (addr, server) = spawn_server(1, |_, received, _| {
        assert_eq!(received.line, "reserve");
        thread::sleep(Duration::from_millis(1_500));
    });

    let mut client = client_with_addr(addr);
    let err = client.reserve().unwrap_err();
    assert!(matches!(err, ClientError::Io(_)));
    server.join().expect("server");
}

#[test]
fn client_connect_refused() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr").to_string();
    drop(listener);

    let err = Client::connect_to(addr).err().expect("connect should fail");
    assert!(err.is_connectivity());
}
