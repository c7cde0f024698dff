mod common;

use std::time::Duration;

use assistant_text::config::{Config, DeviceSettings};
use assistant_text::repl::{self, ErrorPolicy};
use assistant_text::{connect, AccessToken, AssistError, Conversation, SessionSettings, TextAssistant};
use common::{reply, StubAssistant};

fn config() -> Config {
    Config {
        device: DeviceSettings {
            model_id: "stub-model".into(),
            instance_id: "stub-device".into(),
        },
        grpc_deadline_secs: 5,
        ..Config::default()
    }
}

#[tokio::test]
async fn single_shot_over_grpc() {
    let stub = StubAssistant::scripted(vec![vec![reply("R1", b"S1")]]);
    let addr = stub.serve().await;

    let channel = connect(&addr, &AccessToken::new("ya29.test")).await.unwrap();
    let mut assistant = TextAssistant::new(SessionSettings::from_config(&config()), channel);
    let mut out = Vec::new();
    repl::single_shot(&mut assistant, "T", &mut out).await.unwrap();

    assert_eq!(String::from_utf8(out).unwrap(), "R1\n");
    let calls = stub.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].authorization.as_deref(), Some("Bearer ya29.test"));
    assert_eq!(calls[0].requests.len(), 1);
    assert!(calls[0].conversation_state().is_empty());
}

#[tokio::test]
async fn interactive_over_grpc_threads_conversation_state() {
    let stub = StubAssistant::scripted(vec![
        vec![reply("Hi!", b"S1")],
        vec![reply("Goodbye!", b"S2")],
    ]);
    let addr = stub.serve().await;
    let config = config();

    let channel = connect(&addr, &AccessToken::new("t")).await.unwrap();
    let mut assistant = TextAssistant::new(SessionSettings::from_config(&config), channel);
    let mut out = Vec::new();
    repl::interactive(
        &mut assistant,
        &config.prompt,
        ErrorPolicy::FailFast,
        &b"hello\nbye\n"[..],
        &mut out,
    )
    .await
    .unwrap();

    let printed = String::from_utf8(out).unwrap();
    let hi = printed.find("<@assistant> Hi!\n").unwrap();
    let bye = printed.find("<@assistant> Goodbye!\n").unwrap();
    assert!(hi < bye);

    let calls = stub.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls[0].conversation_state().is_empty());
    assert_eq!(calls[1].conversation_state(), b"S1");
    assert_eq!(assistant.conversation(), &Conversation::Ongoing(b"S2".to_vec()));
}

#[tokio::test]
async fn multi_message_exchange_keeps_last_values() {
    let stub = StubAssistant::scripted(vec![vec![
        reply("", b"early"),
        reply("partial", b""),
        reply("final", b"late"),
        reply("", b""),
    ]]);
    let addr = stub.serve().await;

    let channel = connect(&addr, &AccessToken::new("t")).await.unwrap();
    let mut assistant = TextAssistant::new(SessionSettings::from_config(&config()), channel);

    let text = assistant.assist("tell me something").await.unwrap();
    assert_eq!(text.as_deref(), Some("final"));
    assert_eq!(assistant.conversation(), &Conversation::Ongoing(b"late".to_vec()));
}

#[tokio::test]
async fn deadline_exceeded_keeps_previous_state() {
    let stub = StubAssistant::scripted(vec![vec![reply("Hi!", b"S1")], vec![reply("late", b"S2")]])
        .with_delay_from(1, Duration::from_secs(2));
    let addr = stub.serve().await;

    let mut settings = SessionSettings::from_config(&config());
    settings.deadline = Duration::from_millis(200);
    let channel = connect(&addr, &AccessToken::new("t")).await.unwrap();
    let mut assistant = TextAssistant::new(settings, channel);

    assistant.assist("hello").await.unwrap();
    let err = assistant.assist("are you there").await.unwrap_err();
    match err {
        AssistError::DeadlineExceeded(_) => {}
        AssistError::Status(status) => assert!(matches!(
            status.code(),
            tonic::Code::DeadlineExceeded | tonic::Code::Cancelled
        )),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(assistant.conversation(), &Conversation::Ongoing(b"S1".to_vec()));
}

#[tokio::test]
async fn unreachable_endpoint_fails_to_connect() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = connect(&format!("http://{addr}"), &AccessToken::new("t"))
        .await
        .err();
    assert!(matches!(err, Some(AssistError::Connect { .. })));
}
