// Library root
// -----------
// This crate exposes the developer portal client as a library; the binary
// (`main.rs`) wires it to an interactive terminal menu.
//
// Module responsibilities:
// - `api`: the authenticated HTTP pipeline (bearer tokens, case conversion,
//   envelope unwrapping, error normalization, unauthorized callback).
// - `auth`: token claims and the single-flight token refresh.
// - `portal`: one method per portal endpoint; `models` holds their shapes.
// - `eip712`: the signed field-update diff sent when saving a plugin.
// - `wallet` / `session`: the external signer and the sign-in/out flows.
// - `storage`: persisted preferences, vaults and tokens.
// - `third_party`: price and token lookups.
// - `ui`: the menu, delegating every request to the modules above.
pub mod api;
pub mod auth;
pub mod case;
pub mod config;
pub mod eip712;
pub mod error;
pub mod format;
pub mod models;
pub mod portal;
pub mod session;
pub mod storage;
pub mod third_party;
pub mod ui;
pub mod wallet;
