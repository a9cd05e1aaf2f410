use std::sync::Arc;

use reqwest::Method;

use super::*;
use crate::agent::state::WorkerState;
use crate::agent::test_support::{FakeBlobService, run_async_test, test_settings};

fn worker() -> Result<WorkerState, String> {
    Ok(WorkerState::new(Arc::new(test_settings()?), Some(11)))
}

async fn run(
    registry: &ActionRegistry,
    name: &str,
    state: &mut WorkerState,
    target: &FakeBlobService,
) -> Result<Verdict, String> {
    registry
        .execute(name, state, target)
        .await
        .map_err(|err| err.to_string())
}

#[test]
fn builtins_cover_catalog() -> Result<(), String> {
    let registry = ActionRegistry::with_builtins();
    let expected = [
        UPLOAD,
        REPLACE,
        DELETE,
        LIST,
        FETCH,
        FETCH_ANONYMOUS,
        MAKE_PRIVATE,
        MAKE_PUBLIC,
        FETCH_HASH,
    ];
    if registry.names() != expected {
        return Err(format!("Unexpected names: {:?}", registry.names()));
    }
    if registry.bootstrap().is_err() {
        return Err("Missing bootstrap action".to_owned());
    }
    if registry.get(LIST_WRONG_TOKEN).is_some() {
        return Err("Negative auth action must be opt-in".to_owned());
    }
    Ok(())
}

#[test]
fn duplicate_registration_is_rejected() -> Result<(), String> {
    let mut registry = ActionRegistry::with_builtins();
    if registry.register_action(Upload).is_ok() {
        return Err("Expected duplicate upload to fail".to_owned());
    }
    registry
        .register_action(ListWrongToken)
        .map_err(|err| err.to_string())?;
    if registry.len() != 10 {
        return Err(format!("Expected 10 actions, got {}", registry.len()));
    }
    Ok(())
}

#[test]
fn empty_registry_has_no_bootstrap() -> Result<(), String> {
    let registry = ActionRegistry::new();
    if registry.bootstrap().is_ok() || !registry.is_empty() {
        return Err("Empty registry should have no bootstrap".to_owned());
    }
    Ok(())
}

#[test]
fn unknown_action_is_harness_fault() -> Result<(), String> {
    run_async_test(async {
        let registry = ActionRegistry::with_builtins();
        let mut state = worker()?;
        let target = FakeBlobService::new();
        if registry.execute("teleport", &mut state, &target).await.is_ok() {
            return Err("Expected unknown action error".to_owned());
        }
        Ok(())
    })
}

#[test]
fn upload_registers_returned_id() -> Result<(), String> {
    run_async_test(async {
        let registry = ActionRegistry::with_builtins();
        let mut state = worker()?;
        let target = FakeBlobService::new().with_upload_id("b1");
        let verdict = run(&registry, UPLOAD, &mut state, &target).await?;
        if !verdict.is_passed() {
            return Err(format!("Upload failed: {:?}", verdict));
        }
        if state.owned_blobs() != ["b1"] || state.last_blob() != Some("b1") {
            return Err(format!("Unexpected owned blobs {:?}", state.owned_blobs()));
        }
        let seen = target.seen();
        let Some(request) = seen.first() else {
            return Err("No request recorded".to_owned());
        };
        if request.method != Method::POST || !request.authenticated {
            return Err("Upload must be an authenticated POST".to_owned());
        }
        if !matches!(request.file_len, Some(8 | 16)) {
            return Err(format!("Unexpected payload size {:?}", request.file_len));
        }
        Ok(())
    })
}

#[test]
fn upload_non_created_status_fails() -> Result<(), String> {
    run_async_test(async {
        let registry = ActionRegistry::with_builtins();
        let mut state = worker()?;
        let target = FakeBlobService::new().failing(Method::POST, 200);
        let verdict = run(&registry, UPLOAD, &mut state, &target).await?;
        match verdict.failure_message() {
            Some(message) if message.contains("Expected status code 201, but got 200") => {}
            other => return Err(format!("Unexpected verdict message {:?}", other)),
        }
        if state.has_blobs() {
            return Err("Failed upload must not register a blob".to_owned());
        }
        Ok(())
    })
}

#[test]
fn failed_delete_keeps_local_state() -> Result<(), String> {
    run_async_test(async {
        let registry = ActionRegistry::with_builtins();
        let mut state = worker()?;
        let target = FakeBlobService::new().failing(Method::DELETE, 500);
        run(&registry, UPLOAD, &mut state, &target).await?;
        let before = state.owned_blobs().to_vec();
        let verdict = run(&registry, DELETE, &mut state, &target).await?;
        if verdict.is_passed() {
            return Err("Delete against 500 should fail".to_owned());
        }
        if verdict.failure_message().is_none_or(|message| message.is_empty()) {
            return Err("Failure message must not be empty".to_owned());
        }
        if state.owned_blobs() != before.as_slice() {
            return Err("Failed delete changed local state".to_owned());
        }
        Ok(())
    })
}

#[test]
fn delete_forgets_last_blob() -> Result<(), String> {
    run_async_test(async {
        let registry = ActionRegistry::with_builtins();
        let mut state = worker()?;
        let target = FakeBlobService::new();
        run(&registry, UPLOAD, &mut state, &target).await?;
        run(&registry, UPLOAD, &mut state, &target).await?;
        run(&registry, MAKE_PRIVATE, &mut state, &target).await?;
        let verdict = run(&registry, DELETE, &mut state, &target).await?;
        if !verdict.is_passed() {
            return Err(format!("Delete failed: {:?}", verdict));
        }
        if state.owned_blobs() != ["b1"] || target.stored_ids() != ["b1"] {
            return Err(format!("Unexpected owned blobs {:?}", state.owned_blobs()));
        }
        if state
            .private_blobs()
            .iter()
            .any(|blob| !state.owned_blobs().contains(blob))
        {
            return Err("Private blob outlived delete".to_owned());
        }
        Ok(())
    })
}

#[test]
fn list_of_nothing_matches() -> Result<(), String> {
    run_async_test(async {
        let registry = ActionRegistry::with_builtins();
        let mut state = worker()?;
        let target = FakeBlobService::new();
        let verdict = run(&registry, LIST, &mut state, &target).await?;
        if !verdict.is_passed() {
            return Err(format!("Empty list should match: {:?}", verdict));
        }
        Ok(())
    })
}

#[test]
fn list_detects_divergence() -> Result<(), String> {
    run_async_test(async {
        let registry = ActionRegistry::with_builtins();
        let mut state = worker()?;
        let target = FakeBlobService::new();
        run(&registry, UPLOAD, &mut state, &target).await?;
        state.new_blob("phantom".to_owned());
        let verdict = run(&registry, LIST, &mut state, &target).await?;
        match verdict.failure_message() {
            Some(message) if message.contains("different") => Ok(()),
            other => Err(format!("Unexpected verdict {:?}", other)),
        }
    })
}

#[test]
fn visibility_round_trip() -> Result<(), String> {
    run_async_test(async {
        let registry = ActionRegistry::with_builtins();
        let mut state = worker()?;
        let target = FakeBlobService::new();
        run(&registry, UPLOAD, &mut state, &target).await?;
        let first = run(&registry, MAKE_PRIVATE, &mut state, &target).await?;
        if state.private_blobs() != ["b1"] {
            return Err(format!("Expected b1 private, got {:?}", state.private_blobs()));
        }
        let second = run(&registry, MAKE_PUBLIC, &mut state, &target).await?;
        if !first.is_passed() || !second.is_passed() {
            return Err("Visibility flips should pass".to_owned());
        }
        if !state.private_blobs().is_empty() || state.owned_blobs() != ["b1"] {
            return Err("Blob should be owned and public".to_owned());
        }
        let flags: Vec<Option<bool>> = target
            .seen()
            .iter()
            .filter_map(|request| request.json.as_ref())
            .map(|body| body.get("public").and_then(serde_json::Value::as_bool))
            .collect();
        if flags != [Some(false), Some(true)] {
            return Err(format!("Unexpected visibility bodies {:?}", flags));
        }
        Ok(())
    })
}

#[test]
fn make_public_without_private_blob_bootstraps() -> Result<(), String> {
    run_async_test(async {
        let registry = ActionRegistry::with_builtins();
        let mut state = worker()?;
        let target = FakeBlobService::new();
        let verdict = run(&registry, MAKE_PUBLIC, &mut state, &target).await?;
        if !verdict.is_passed() {
            return Err(format!("Already-public flip should pass: {:?}", verdict));
        }
        if state.owned_blobs() != ["b1"] || !state.private_blobs().is_empty() {
            return Err("Expected one public blob".to_owned());
        }
        Ok(())
    })
}

#[test]
fn anonymous_fetch_bootstraps_and_drops_credentials() -> Result<(), String> {
    run_async_test(async {
        let registry = ActionRegistry::with_builtins();
        let mut state = worker()?;
        let target = FakeBlobService::new();
        let verdict = run(&registry, FETCH_ANONYMOUS, &mut state, &target).await?;
        if !verdict.is_passed() {
            return Err(format!("Anonymous fetch failed: {:?}", verdict));
        }
        let seen = target.seen();
        let methods: Vec<(Method, bool)> = seen
            .iter()
            .map(|request| (request.method.clone(), request.authenticated))
            .collect();
        if methods != [(Method::POST, true), (Method::GET, false)] {
            return Err(format!("Unexpected request sequence {:?}", methods));
        }
        Ok(())
    })
}

#[test]
fn anonymous_fetch_skips_private_blobs() -> Result<(), String> {
    run_async_test(async {
        let registry = ActionRegistry::with_builtins();
        let mut state = worker()?;
        let target = FakeBlobService::new();
        run(&registry, UPLOAD, &mut state, &target).await?;
        run(&registry, MAKE_PRIVATE, &mut state, &target).await?;
        let verdict = run(&registry, FETCH_ANONYMOUS, &mut state, &target).await?;
        if !verdict.is_passed() {
            return Err(format!("Anonymous fetch failed: {:?}", verdict));
        }
        if state.owned_blobs().len() != 2 {
            return Err("Expected a second, public blob to be uploaded".to_owned());
        }
        Ok(())
    })
}

#[test]
fn hash_query_uses_known_algorithm() -> Result<(), String> {
    run_async_test(async {
        let registry = ActionRegistry::with_builtins();
        let mut state = worker()?;
        let target = FakeBlobService::new();
        run(&registry, UPLOAD, &mut state, &target).await?;
        let verdict = run(&registry, FETCH_HASH, &mut state, &target).await?;
        if !verdict.is_passed() {
            return Err(format!("Hash fetch failed: {:?}", verdict));
        }
        let seen = target.seen();
        let Some(request) = seen.last() else {
            return Err("No request recorded".to_owned());
        };
        if request.path != "/api/v1/blob/b1/hash" {
            return Err(format!("Unexpected path {}", request.path));
        }
        match request.query.first() {
            Some(("type", value)) if value == "md5" || value == "sha256" => Ok(()),
            other => Err(format!("Unexpected query {:?}", other)),
        }
    })
}

#[test]
fn replace_and_fetch_pass_against_contract() -> Result<(), String> {
    run_async_test(async {
        let registry = ActionRegistry::with_builtins();
        let mut state = worker()?;
        let target = FakeBlobService::new();
        for name in [REPLACE, FETCH] {
            let verdict = run(&registry, name, &mut state, &target).await?;
            if !verdict.is_passed() {
                return Err(format!("{} failed: {:?}", name, verdict));
            }
        }
        if state.owned_blobs() != ["b1"] {
            return Err("Replace should have bootstrapped exactly one blob".to_owned());
        }
        Ok(())
    })
}

#[test]
fn wrong_token_must_be_rejected() -> Result<(), String> {
    run_async_test(async {
        let mut registry = ActionRegistry::with_builtins();
        registry
            .register_action(ListWrongToken)
            .map_err(|err| err.to_string())?;
        let mut state = worker()?;
        let target = FakeBlobService::new();
        let verdict = run(&registry, LIST_WRONG_TOKEN, &mut state, &target).await?;
        if !verdict.is_passed() {
            return Err(format!("Rejected token should pass: {:?}", verdict));
        }
        let lenient = FakeBlobService::new().failing(Method::GET, 201);
        let verdict = run(&registry, LIST_WRONG_TOKEN, &mut state, &lenient).await?;
        if verdict.is_passed() {
            return Err("Accepted invalid token should fail".to_owned());
        }
        Ok(())
    })
}

#[test]
fn transport_failure_propagates() -> Result<(), String> {
    run_async_test(async {
        let registry = ActionRegistry::with_builtins();
        let mut state = worker()?;
        let target = FakeBlobService::new().unreachable();
        if registry.execute(UPLOAD, &mut state, &target).await.is_ok() {
            return Err("Transport failure must not become a verdict".to_owned());
        }
        Ok(())
    })
}
