use super::*;
use crate::netbios::frame;
use tokio::net::TcpListener;

#[derive(Debug)]
enum Event {
    State(TransportState),
    Receive(Bytes),
    Error(String),
}

struct Recorder(mpsc::UnboundedSender<Event>);

impl TransportEvents for Recorder {
    fn on_state(&self, state: TransportState) {
        let _ = self.0.send(Event::State(state));
    }

    fn on_receive(&self, message: Bytes) {
        let _ = self.0.send(Event::Receive(message));
    }

    fn on_error(&self, error: Error) {
        let _ = self.0.send(Event::Error(error.to_string()));
    }
}

fn recorder() -> (Arc<dyn TransportEvents>, mpsc::UnboundedReceiver<Event>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Arc::new(Recorder(tx)), rx)
}

async fn next_event(rx: &mut mpsc::UnboundedReceiver<Event>) -> Event {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("event within 5s")
        .expect("event channel open")
}

#[test]
fn test_socket_target_brackets_ipv6() {
    assert_eq!(socket_target("nas", 445), "nas:445");
    assert_eq!(socket_target("::1", 445), "[::1]:445");
}

#[tokio::test]
async fn test_echo_through_peer() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let peer = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let message = frame::read_frame(&mut stream).await.unwrap().unwrap();
        let reply = frame::encode_frame(&message).unwrap();
        frame::write_frame(&mut stream, &reply).await.unwrap();
    });

    let (events, mut rx) = recorder();
    let handle = TcpTransport::open("127.0.0.1", port, Duration::from_secs(5), events);

    assert!(matches!(next_event(&mut rx).await, Event::State(TransportState::Connecting)));
    assert!(matches!(next_event(&mut rx).await, Event::State(TransportState::Ready)));

    handle.send(Bytes::from_static(b"ping")).unwrap();
    match next_event(&mut rx).await {
        Event::Receive(message) => assert_eq!(&message[..], b"ping"),
        other => panic!("unexpected event {:?}", other),
    }

    peer.await.unwrap();
    assert!(matches!(next_event(&mut rx).await, Event::Error(_)));
    assert!(matches!(next_event(&mut rx).await, Event::State(TransportState::Closed)));
}

#[tokio::test]
async fn test_refused_connection_reports_failure() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    };

    let (events, mut rx) = recorder();
    let _handle = TcpTransport::open("127.0.0.1", port, Duration::from_secs(5), events);

    assert!(matches!(next_event(&mut rx).await, Event::State(TransportState::Connecting)));
    match next_event(&mut rx).await {
        Event::State(TransportState::Failed(reason)) => assert!(reason.contains("127.0.0.1")),
        other => panic!("unexpected event {:?}", other),
    }
}

#[tokio::test]
async fn test_cancel_stops_task() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let (events, mut rx) = recorder();
    let handle = TcpTransport::open("127.0.0.1", port, Duration::from_secs(5), events);
    let _accepted = listener.accept().await.unwrap();
    assert!(matches!(next_event(&mut rx).await, Event::State(TransportState::Connecting)));
    assert!(matches!(next_event(&mut rx).await, Event::State(TransportState::Ready)));

    handle.cancel();
    tokio::time::timeout(Duration::from_secs(5), async {
        while !handle.is_finished() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .unwrap();
    assert!(handle.send(Bytes::from_static(b"late")).is_err());
}
