//! End-to-end account scenarios against the simulated core and host.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use toxbridge_adapter::{
    Decision, HostAction, HostCommand, NetworkCore, SetupChoice,
    dispatcher::{INVALID_ACCOUNT_FILE_TEXT, INVALID_ADDRESS_TEXT, INVALID_STORED_ACCOUNT_TEXT},
};
use toxbridge_core::{
    AccountBlob, AccountConfig, CorePresence, MAX_ACCOUNT_DATA_SIZE, Presence, PublicKey,
    SettingKey, StatusValue, ToxAddress,
};
use toxbridge_harness::{
    InvariantRegistry, ReceivedMessage, RecordingHost, SentMessage, SimCore, SimWorld,
    TraceSnapshot, sim_env::SIM_EPOCH_SECS,
};

fn peer(n: u8) -> ToxAddress {
    ToxAddress::from_parts(PublicKey::from_bytes([n; 32]), [n, 0, 0, 1])
}

fn existing_account() -> AccountConfig {
    AccountConfig { messenger: Some(String::new()), ..Default::default() }
}

fn logged_in(seed: u64) -> SimWorld {
    let mut world = SimWorld::with_config(existing_account());
    world.login(SimCore::new(seed));
    world
}

fn connect(world: &mut SimWorld) -> Vec<HostAction> {
    world.core_mut().unwrap().set_dht(true);
    world.connectivity_tick()
}

fn assert_invariants(world: &SimWorld) {
    let result = InvariantRegistry::standard().check_all(&TraceSnapshot::from_host(world.host()));
    assert!(result.is_ok(), "{result:?}");
}

fn summary(actions: &[HostAction]) -> String {
    let lines: Vec<String> = actions
        .iter()
        .map(|action| match action {
            HostAction::Progress { text, step, total } => format!("progress {text} {step}/{total}"),
            HostAction::SetConnected => "connected".to_string(),
            HostAction::ScheduleTicks { .. } => "schedule ticks".to_string(),
            HostAction::CancelTicks => "cancel ticks".to_string(),
            HostAction::RequestAccountSetup { .. } => "setup prompt".to_string(),
            HostAction::StoreSetting { key, value } => {
                let shown = match value.as_deref() {
                    None => "<unset>",
                    Some("") => "<empty>",
                    Some(_) => "<blob>",
                };
                format!("store {} {shown}", key.as_str())
            },
            other => format!("{other:?}"),
        })
        .collect();
    lines.join("\n")
}

#[test]
fn first_login_to_logout() {
    let mut world = SimWorld::with_config(AccountConfig::default());
    world.login(SimCore::new(1));
    assert_eq!(world.host().setup_prompts(), 1);
    assert!(world.core().is_none());

    world.command(HostCommand::Setup(SetupChoice::CreateNew));
    world.core_mut().unwrap().set_dht(true);
    world.run_for(Duration::from_secs(2));
    assert!(world.host().is_connected());
    world.close();

    insta::assert_snapshot!(summary(world.host().trace()), @r"
    setup prompt
    store messenger <empty>
    progress Connecting 0/2
    schedule ticks
    progress Connected 1/2
    connected
    cancel ticks
    store messenger <blob>
    ");
    assert_invariants(&world);
}

#[test]
fn liveness_edges_produce_one_batch_each() {
    let mut world = logged_in(1);

    assert!(world.connectivity_tick().is_empty());
    let first = connect(&mut world);
    assert_eq!(first.iter().filter(|a| **a == HostAction::SetConnected).count(), 1);
    assert!(world.connectivity_tick().is_empty());

    world.core_mut().unwrap().set_dht(false);
    assert_eq!(world.connectivity_tick(), vec![HostAction::Progress {
        text: "Connecting",
        step: 0,
        total: 2
    }]);
    assert!(connect(&mut world).contains(&HostAction::SetConnected));
    assert_invariants(&world);
}

#[test]
fn stored_contacts_get_status_on_connect() {
    let online = peer(1).public_key();
    let busy = peer(2).public_key();
    let missing = peer(3).public_key();

    let mut core = SimCore::new(1);
    core.befriend(online);
    core.set_online(&online, true);
    core.befriend(busy);
    core.set_online(&busy, true);
    core.set_friend_presence(&busy, CorePresence::Busy);
    core.rename_friend(&busy, "Bea");

    let host = RecordingHost::new(existing_account()).with_contacts([online, busy, missing]);
    let mut world = SimWorld::new(host);
    world.login(core);
    connect(&mut world);

    let status = |key: &PublicKey| world.host().contact(key).unwrap().status.clone();
    assert_eq!(status(&online), Some(StatusValue::new(Presence::Online)));
    assert_eq!(status(&busy), Some(StatusValue::new(Presence::Busy)));
    assert_eq!(status(&missing), Some(StatusValue::new(Presence::Offline)));
    assert_eq!(world.host().contact(&busy).unwrap().alias.as_deref(), Some("Bea"));
    assert_invariants(&world);
}

#[test]
fn accepted_request_adds_without_sending_one() {
    let mut world = logged_in(1);
    connect(&mut world);
    let stranger = peer(7).public_key();

    world.core_mut().unwrap().receive_request(stranger, "let me in");
    world.core_mut().unwrap().receive_request(stranger, "please");
    world.network_tick();
    assert_eq!(world.host().prompts().len(), 1);

    let prompt = world.host().prompts()[0].clone();
    assert_eq!(prompt.from, stranger);
    assert_eq!(prompt.message.as_deref(), Some("let me in"));

    let answer = HostCommand::Authorize { request: prompt.request, decision: Decision::Accept };
    world.command(answer.clone());
    let calls = world.core().unwrap().calls();
    assert_eq!(calls.request_adds, 0);
    assert_eq!(calls.quiet_adds, 1);
    assert!(world.host().contact(&stranger).is_some());

    assert!(world.command(answer).is_empty());
    assert_eq!(world.core().unwrap().calls().quiet_adds, 1);
    assert_invariants(&world);
}

#[test]
fn declined_request_leaves_no_trace() {
    let mut world = logged_in(1);
    let stranger = peer(8).public_key();

    world.core_mut().unwrap().receive_request(stranger, "");
    world.network_tick();
    let prompt = world.host().prompts()[0].clone();
    assert_eq!(prompt.message, None);

    world.command(HostCommand::Authorize { request: prompt.request, decision: Decision::Decline });
    assert!(!world.core().unwrap().is_friend(&stranger));
    assert!(world.host().contact(&stranger).is_none());
}

#[test]
fn malformed_contact_is_rejected_without_core_call() {
    let mut world = logged_in(1);

    world.command(HostCommand::AddContact { name: "deadbeef".into(), invite: String::new() });

    assert_eq!(world.core().unwrap().calls().request_adds, 0);
    assert!(!world.host().contacts().contains_key("deadbeef"));
    let errors: Vec<&str> = world.host().errors().map(|n| n.primary.as_str()).collect();
    assert_eq!(errors, [INVALID_ADDRESS_TEXT]);
}

#[test]
fn added_contact_is_renamed_to_its_key() {
    let mut world = logged_in(1);
    let address = peer(9);
    let key = address.public_key();

    world.command(HostCommand::AddContact { name: address.to_hex(), invite: String::new() });

    assert!(world.core().unwrap().is_friend(&key));
    assert_eq!(world.core().unwrap().calls().request_adds, 1);
    assert!(!world.host().contacts().contains_key(&address.to_hex()));
    assert_eq!(
        world.host().contact(&key).unwrap().status,
        Some(StatusValue::new(Presence::Offline))
    );

    world.command(HostCommand::AddContact { name: address.to_hex(), invite: String::new() });
    let errors: Vec<&str> = world.host().errors().map(|n| n.primary.as_str()).collect();
    assert_eq!(errors, ["Friend request already sent"]);
    assert!(world.host().contact(&key).is_some());
    assert_invariants(&world);
}

#[test]
fn adding_yourself_is_refused_and_removed() {
    let mut world = logged_in(1);
    let own = world.core().unwrap().self_address().to_hex();

    world.command(HostCommand::AddContact { name: own.clone(), invite: "hi".into() });

    assert!(!world.host().contacts().contains_key(&own));
    let errors: Vec<&str> = world.host().errors().map(|n| n.primary.as_str()).collect();
    assert_eq!(errors, ["You're trying to add yourself as a friend"]);
}

#[test]
fn empty_account_state_is_stored_as_marker() {
    let mut world = SimWorld::with_config(existing_account());
    world.login(SimCore::stateless(1));
    world.close();
    assert_eq!(world.host().config().messenger.as_deref(), Some(""));

    let mut again = SimWorld::new(world.into_host());
    again.login(SimCore::stateless(2));
    assert_eq!(again.host().setup_prompts(), 0);
    assert!(again.dispatcher().session().is_some());
}

#[test]
fn account_survives_logout() {
    let mut world = logged_in(1);
    let address = world.core().unwrap().self_address();
    let friend = peer(3);
    world.command(HostCommand::AddContact { name: friend.to_hex(), invite: "hi".into() });

    let mut world = SimWorld::new(world.into_host());
    world.login(SimCore::new(42));

    let core = world.core().unwrap();
    assert_eq!(core.self_address(), address);
    assert!(core.is_friend(&friend.public_key()));
    assert_eq!(core.calls().loads, 1);
    assert_invariants(&world);
}

#[test]
fn offline_messages_are_delivered_in_order() {
    let key = peer(4).public_key();
    let mut core = SimCore::new(1);
    core.befriend(key);
    let mut world = SimWorld::new(RecordingHost::new(existing_account()).with_contacts([key]));
    world.login(core);

    world.command(HostCommand::SendMessage { to: key.to_hex(), text: "one".into() });
    world.command(HostCommand::SendMessage { to: key.to_hex(), text: "<b>two</b>".into() });
    assert!(world.core().unwrap().sent().is_empty());

    world.core_mut().unwrap().set_online(&key, true);
    world.network_tick();
    let texts: Vec<String> = world.core().unwrap().sent().iter().map(SentMessage::text).collect();
    assert_eq!(texts, ["one", "two"]);

    world.command(HostCommand::SendMessage { to: key.to_hex(), text: "/me three".into() });
    let last = world.core().unwrap().sent().last().unwrap();
    assert!(last.action);
    assert_eq!(last.payload, b"three\0");
}

#[test]
fn bad_import_files_are_rejected_and_prompt_again() {
    let dir = tempfile::tempdir().unwrap();
    let empty = dir.path().join("empty.tox");
    std::fs::write(&empty, b"").unwrap();
    let big = dir.path().join("big.tox");
    std::fs::write(&big, vec![0u8; MAX_ACCOUNT_DATA_SIZE + 1]).unwrap();

    let mut world = SimWorld::with_config(AccountConfig::default());
    world.login(SimCore::new(1));
    world.command(HostCommand::Setup(SetupChoice::ImportFile(empty)));
    world.command(HostCommand::Setup(SetupChoice::ImportFile(big)));

    assert!(world.dispatcher().is_awaiting_setup());
    assert_eq!(world.host().setup_prompts(), 3);
    let errors: Vec<&str> = world.host().errors().map(|n| n.primary.as_str()).collect();
    assert_eq!(errors, [INVALID_ACCOUNT_FILE_TEXT, INVALID_ACCOUNT_FILE_TEXT]);
    assert_eq!(world.host().config().messenger, None);

    let mut source = logged_in(5);
    let address = source.core().unwrap().self_address();
    let path = dir.path().join("me.tox");
    source.command(HostCommand::ExportAccount { path: path.clone() });

    world.command(HostCommand::Setup(SetupChoice::ImportFile(path)));
    assert_eq!(world.core().unwrap().self_address(), address);
    assert!(world.host().config().messenger.as_deref().is_some_and(|m| !m.is_empty()));
}

#[test]
fn unusable_stored_account_is_cleared() {
    let blob = AccountBlob::new(b"not a save".to_vec()).unwrap();
    let config = AccountConfig { messenger: Some(blob.to_config_string()), ..Default::default() };
    let mut world = SimWorld::with_config(config);
    world.login(SimCore::new(1));

    assert_eq!(world.host().setup_prompts(), 1);
    assert_eq!(world.host().config().messenger, None);
    let errors: Vec<&str> = world.host().errors().map(|n| n.primary.as_str()).collect();
    assert_eq!(errors, [INVALID_STORED_ACCOUNT_TEXT]);
}

#[test]
fn received_messages_carry_clock_time() {
    let key = peer(2).public_key();
    let mut core = SimCore::new(1);
    core.befriend(key);
    let mut world = SimWorld::new(RecordingHost::new(existing_account()).with_contacts([key]));
    world.login(core);

    world.env().advance(Duration::from_secs(90));
    world.core_mut().unwrap().receive_action(&key, "waves");
    world.network_tick();

    assert_eq!(world.host().messages(), [ReceivedMessage {
        from: key,
        text: "/me waves".into(),
        timestamp: SIM_EPOCH_SECS + 90,
    }]);
}

#[test]
fn nickname_is_pushed_on_connect_and_updated() {
    let config = AccountConfig { nickname: Some("ana".into()), ..existing_account() };
    let mut world = SimWorld::with_config(config);
    world.login(SimCore::new(1));
    connect(&mut world);

    assert_eq!(world.host().display_name(), Some("ana"));
    assert_eq!(world.core().unwrap().name(), Some("ana"));

    world.command(HostCommand::SetNickname("bea".into()));
    assert_eq!(world.host().config().nickname(), Some("bea"));
    assert_eq!(world.core().unwrap().name(), Some("bea"));
}

#[test]
fn core_name_is_adopted_without_nickname() {
    let mut previous = SimCore::new(3);
    previous.set_self_name("cy");
    let mut buffer = vec![0; previous.save_size()];
    previous.save(&mut buffer);

    let stored = AccountBlob::new(buffer).unwrap().to_config_string();
    let mut world =
        SimWorld::with_config(AccountConfig { messenger: Some(stored), ..Default::default() });
    world.login(SimCore::new(4));
    connect(&mut world);

    assert_eq!(world.host().display_name(), Some("cy"));
    assert_eq!(world.host().config().nickname(), Some("cy"));
}

#[test]
fn own_status_reaches_core() {
    let mut world = logged_in(1);

    world.command(HostCommand::SetStatus {
        status_id: "tox_away".into(),
        message: Some("brb".into()),
    });
    assert_eq!(world.core().unwrap().presence(), CorePresence::Away);
    assert_eq!(world.core().unwrap().status_message(), "brb");

    world.command(HostCommand::SetStatus { status_id: "tox_busy".into(), message: None });
    assert_eq!(world.core().unwrap().presence(), CorePresence::Busy);
    assert_eq!(world.core().unwrap().status_message(), "brb");
}

#[test]
fn nothing_reaches_the_host_after_close() {
    let mut world = logged_in(1);
    connect(&mut world);

    let actions = world.close();
    assert_eq!(actions[0], HostAction::CancelTicks);
    assert!(matches!(
        &actions[1],
        HostAction::StoreSetting { key: SettingKey::Messenger, value: Some(_) }
    ));

    assert!(world.network_tick().is_empty());
    assert!(world.run_for(Duration::from_secs(5)).is_empty());
    assert!(world.command(HostCommand::ShowAccountId).is_empty());
    assert_invariants(&world);
}
