// UI layer: an interactive menu built on `dialoguer`. Each action runs its
// API calls on the tokio runtime behind a spinner; a failing action prints
// its error and drops back to the menu.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use crossterm::style::Stylize;
use dialoguer::theme::{ColorfulTheme, SimpleTheme, Theme as PromptTheme};
use dialoguer::{Confirm, Input, Select};
use indicatif::{ProgressBar, ProgressStyle};
use parking_lot::Mutex;
use tokio::runtime::Runtime;

use crate::api::ApiClient;
use crate::case::{camel_case_to_title, snake_case_to_title};
use crate::eip712::format_updates_summary;
use crate::error::ApiError;
use crate::format::{display_rate, format_date_with_timezone, to_number_format, to_value_format};
use crate::models::{
    CreateApiKeyRequest, EarningStatus, EarningsFilters, KillSwitchUpdate, MyRole, Plugin,
    TeamRole, API_KEY_DISABLED, API_KEY_ENABLED,
};
use crate::session::{self, PluginEdits, SessionError};
use crate::storage::{Currency, Storage, Theme};
use crate::third_party::ThirdPartyClient;
use crate::wallet::{VaultInfo, Wallet, WalletError};

/// Wallet driven by the user: messages are printed, the user signs them in
/// their own wallet app and pastes the result back.
pub struct PromptWallet {
    account: Mutex<Option<String>>,
}

impl PromptWallet {
    pub fn new() -> Self {
        PromptWallet {
            account: Mutex::new(None),
        }
    }

    /// Drop the remembered account so the next connect asks again.
    pub fn forget_account(&self) {
        self.account.lock().take();
    }
}

impl Default for PromptWallet {
    fn default() -> Self {
        Self::new()
    }
}

fn rejected(err: impl Display) -> WalletError {
    WalletError::Rejected(err.to_string())
}

fn prompt_text(prompt: &str) -> Result<String, WalletError> {
    let value: String = Input::new()
        .with_prompt(prompt)
        .interact_text()
        .map_err(rejected)?;
    Ok(value.trim().to_string())
}

#[async_trait]
impl Wallet for PromptWallet {
    async fn request_account(&self) -> Result<String, WalletError> {
        if let Some(account) = self.account.lock().clone() {
            return Ok(account);
        }
        let account = prompt_text("Wallet address (0x...)")?;
        if !account.starts_with("0x") {
            return Err(WalletError::ConnectionFailed);
        }
        *self.account.lock() = Some(account.clone());
        Ok(account)
    }

    async fn vault(&self) -> Result<VaultInfo, WalletError> {
        let name = prompt_text("Vault name")?;
        let public_key_ecdsa = prompt_text("Vault ECDSA public key")?;
        let hex_chain_code = prompt_text("Vault hex chain code")?;
        let is_fast_vault = Confirm::new()
            .with_prompt("Is this a Fast Vault?")
            .interact()
            .map_err(rejected)?;
        Ok(VaultInfo {
            hex_chain_code,
            is_fast_vault,
            name,
            public_key_ecdsa,
            ..Default::default()
        })
    }

    async fn personal_sign(&self, address: &str, message: &str) -> Result<String, WalletError> {
        println!("\nSign this message with {address} (personal_sign):\n\n{message}\n");
        prompt_text("Signature")
    }

    async fn sign_typed_data(
        &self,
        address: &str,
        typed_data: &serde_json::Value,
    ) -> Result<String, WalletError> {
        let pretty = serde_json::to_string_pretty(typed_data).map_err(rejected)?;
        println!("\nSign this typed data with {address} (eth_signTypedData_v4):\n\n{pretty}\n");
        prompt_text("Signature")
    }

    async fn revoke_permissions(&self) -> Result<(), WalletError> {
        self.forget_account();
        Ok(())
    }
}

/// What to run when the server answers 401: the stored session is no longer
/// accepted, so forget it along with the wallet's account.
pub fn sign_out_on_unauthorized(
    storage: Arc<Storage>,
    wallet: Arc<PromptWallet>,
) -> impl Fn() + Send + Sync + 'static {
    move || {
        if let Err(err) = storage.clear_session() {
            tracing::warn!("failed to clear session: {err}");
        }
        wallet.forget_account();
    }
}

/// Everything the menu needs.
pub struct App {
    rt: Runtime,
    api: ApiClient,
    third_party: ThirdPartyClient,
    wallet: Arc<PromptWallet>,
    theme: Box<dyn PromptTheme>,
}

fn prompt_theme(theme: Theme) -> Box<dyn PromptTheme> {
    match theme {
        Theme::Light => Box::new(SimpleTheme),
        Theme::Dark => Box::new(ColorfulTheme::default()),
    }
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn success(msg: impl Display) {
    println!("{}", format!("✓ {msg}").green());
}

fn failure(msg: impl Display) {
    println!("{}", format!("✗ {msg}").red());
}

fn notice(msg: impl Display) {
    println!("{}", msg.to_string().yellow());
}

impl App {
    pub fn new(
        rt: Runtime,
        api: ApiClient,
        third_party: ThirdPartyClient,
        wallet: Arc<PromptWallet>,
    ) -> Self {
        let theme = prompt_theme(api.storage().theme());
        App {
            rt,
            api,
            third_party,
            wallet,
            theme,
        }
    }

    /// Run `fut` to completion behind a spinner.
    fn run<F: Future>(&self, msg: &str, fut: F) -> F::Output {
        let pb = spinner(msg);
        let out = self.rt.block_on(fut);
        pb.finish_and_clear();
        out
    }

    fn select(&self, prompt: &str, items: &[String]) -> Result<Option<usize>> {
        Ok(Select::with_theme(self.theme.as_ref())
            .with_prompt(prompt)
            .items(items)
            .default(0)
            .interact_opt()?)
    }

    fn confirm(&self, prompt: &str) -> Result<bool> {
        Ok(Confirm::with_theme(self.theme.as_ref())
            .with_prompt(prompt)
            .default(false)
            .interact()?)
    }

    fn input(&self, prompt: &str, initial: &str) -> Result<String> {
        Ok(Input::<String>::with_theme(self.theme.as_ref())
            .with_prompt(prompt)
            .with_initial_text(initial)
            .allow_empty(true)
            .interact_text()?)
    }

    fn status_line(&self) -> String {
        match self.api.storage().active_vault() {
            Some(vault) => format!("Connected: {}", vault.name.as_str().bold()),
            None => "Not connected".to_string(),
        }
    }

    /// Main loop. Returns when the user picks "Exit".
    pub fn main_menu(&mut self) -> Result<()> {
        loop {
            println!("\n{}", self.status_line());
            let items = [
                "Connect vault",
                "Plugins",
                "Earnings",
                "Accept team invite",
                "Settings",
                "Disconnect",
                "Exit",
            ]
            .map(String::from);
            let Some(selection) = self.select("Developer portal", &items)? else {
                break;
            };
            let outcome = match selection {
                0 => self.handle_connect(),
                1 => self.handle_plugins(),
                2 => self.handle_earnings(),
                3 => self.handle_accept_invite(),
                4 => self.handle_settings(),
                5 => self.handle_disconnect(),
                _ => break,
            };
            // Prompt failures (e.g. no terminal) end the loop; API failures
            // were already reported inside the handler.
            outcome?;
        }
        Ok(())
    }

    fn handle_connect(&mut self) -> Result<()> {
        match self.rt.block_on(session::connect(&self.api, &*self.wallet)) {
            Ok(vault) => success(format!("Connected {}", vault.name)),
            Err(err) => failure(err),
        }
        Ok(())
    }

    fn handle_disconnect(&mut self) -> Result<()> {
        if self.api.storage().active_vault().is_none() {
            notice("No vault connected.");
            return Ok(());
        }
        if !self.confirm("Disconnect this vault?")? {
            return Ok(());
        }
        match self.run("Disconnecting...", session::disconnect(&self.api, &*self.wallet)) {
            Ok(()) => success("Disconnected"),
            Err(err) => failure(err),
        }
        Ok(())
    }

    fn handle_plugins(&mut self) -> Result<()> {
        let plugins = match self.run("Loading plugins...", self.api.list_plugins()) {
            Ok(plugins) => plugins,
            Err(err) => {
                failure(err);
                return Ok(());
            }
        };
        if plugins.is_empty() {
            notice("No plugins yet.");
            return Ok(());
        }
        let items: Vec<String> = plugins
            .iter()
            .map(|p| format!("{} [{}]", p.title, p.category))
            .collect();
        if let Some(idx) = self.select("Plugin", &items)? {
            self.plugin_menu(&plugins[idx].id)?;
        }
        Ok(())
    }

    fn plugin_menu(&mut self, plugin_id: &str) -> Result<()> {
        loop {
            let plugin = match self.run("Loading plugin...", self.api.get_plugin(plugin_id)) {
                Ok(Some(plugin)) => plugin,
                Ok(None) => {
                    failure("Plugin not found");
                    return Ok(());
                }
                Err(err) => {
                    failure(err);
                    return Ok(());
                }
            };
            let role = self
                .run("Checking access...", self.api.my_role(plugin_id))
                .map_err(|err| tracing::warn!("could not fetch role: {err}"))
                .ok();

            self.print_plugin(&plugin, role.as_ref());

            let items = ["Edit details", "Pricing", "API keys", "Team", "Kill switch", "Back"]
                .map(String::from);
            let outcome = match self.select("Action", &items)? {
                Some(0) => self.handle_edit(&plugin, role),
                Some(1) => self.handle_pricing(&plugin),
                Some(2) => self.handle_api_keys(&plugin),
                Some(3) => self.handle_team(&plugin),
                Some(4) => self.handle_kill_switch(&plugin, role),
                _ => return Ok(()),
            };
            outcome?;
        }
    }

    fn print_plugin(&self, plugin: &Plugin, role: Option<&MyRole>) {
        println!("\n{}", plugin.title.as_str().bold());
        for (field, value) in plugin.editable_fields() {
            println!("  {:<16} {}", camel_case_to_title(field), value);
        }
        println!("  {:<16} {}", "Updated", format_date_with_timezone(&plugin.updated_at));
        match role.map(|r| r.role) {
            Some(TeamRole::Viewer) => {
                notice("You have viewer access: you can view settings but cannot make changes.")
            }
            Some(TeamRole::Editor) => notice(
                "You have editor access: you can edit title and description, but not the server endpoint.",
            ),
            Some(TeamRole::Staff) => {
                notice("You have staff access: you can only manage the kill switch.")
            }
            _ => {}
        }
    }

    fn handle_edit(&mut self, plugin: &Plugin, role: Option<MyRole>) -> Result<()> {
        let Some(role) = role.filter(|r| r.can_edit) else {
            notice("You can't edit this plugin.");
            return Ok(());
        };

        let mut edits = PluginEdits::from_plugin(plugin);
        for (field, slot) in [
            ("title", &mut edits.title),
            ("description", &mut edits.description),
            ("serverEndpoint", &mut edits.server_endpoint),
        ] {
            if role.can_edit_field(field) {
                *slot = self.input(&camel_case_to_title(field), slot.as_str())?;
            }
        }

        let updates = edits.updates_from(plugin);
        if updates.is_empty() {
            notice("No changes to save");
            return Ok(());
        }
        println!("\n{}\n", format_updates_summary(&updates));
        if !self.confirm("Sign and save these changes?")? {
            return Ok(());
        }

        match self
            .rt
            .block_on(session::save_plugin(&self.api, &*self.wallet, plugin, &edits))
        {
            Ok(_) => success("Plugin updated successfully"),
            Err(SessionError::NothingToSave) => notice("No changes to save"),
            Err(err) => failure(err),
        }
        Ok(())
    }

    fn handle_pricing(&mut self, plugin: &Plugin) -> Result<()> {
        match self.run("Loading pricing...", self.api.plugin_pricings(&plugin.id)) {
            Ok(pricings) if pricings.is_empty() => notice("This plugin is free."),
            Ok(pricings) => {
                for p in pricings {
                    let frequency = p.frequency.map(|f| format!(" ({f})")).unwrap_or_default();
                    println!(
                        "  {}{} {} - {}: {}",
                        p.kind,
                        frequency,
                        p.asset.to_uppercase(),
                        p.metric,
                        to_number_format(&p.amount.to_string(), 6)
                    );
                }
            }
            Err(err) => failure(err),
        }
        Ok(())
    }

    fn handle_api_keys(&mut self, plugin: &Plugin) -> Result<()> {
        let keys = match self.run("Loading API keys...", self.api.api_keys(&plugin.id)) {
            Ok(keys) => keys,
            Err(err) => {
                failure(err);
                return Ok(());
            }
        };

        let mut items: Vec<String> = keys
            .iter()
            .map(|k| {
                let state = if k.is_enabled() { "enabled" } else { "disabled" };
                let expiry = k.expires_at.as_deref().unwrap_or("never");
                format!("{} ({state}, expires {expiry})", k.apikey)
            })
            .collect();
        items.push("Create new key".to_string());
        items.push("Back".to_string());

        let Some(idx) = self.select("API keys", &items)? else {
            return Ok(());
        };
        if idx == keys.len() {
            return self.create_api_key(plugin);
        }
        let Some(key) = keys.get(idx) else {
            return Ok(());
        };

        let toggle = if key.is_enabled() { "Disable" } else { "Enable" };
        let actions = [toggle, "Delete", "Back"].map(String::from);
        match self.select("Key action", &actions)? {
            Some(0) => {
                let status = if key.is_enabled() { API_KEY_DISABLED } else { API_KEY_ENABLED };
                match self.run(
                    "Updating key...",
                    self.api.set_api_key_status(&plugin.id, &key.id, status),
                ) {
                    Ok(_) => success("API key updated"),
                    Err(err) => failure(err),
                }
            }
            Some(1) => {
                if self.confirm("Delete this API key? It stops working immediately.")? {
                    match self.run("Deleting key...", self.api.delete_api_key(&plugin.id, &key.id)) {
                        Ok(_) => success("API key deleted"),
                        Err(err) => failure(err),
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn create_api_key(&mut self, plugin: &Plugin) -> Result<()> {
        let expiry = self.input("Expires at (RFC3339, empty for never)", "")?;
        let expires_at = match expiry.trim() {
            "" => None,
            raw => match chrono::DateTime::parse_from_rfc3339(raw) {
                Ok(_) => Some(raw.to_string()),
                Err(_) => {
                    failure("Expiry must be an RFC3339 timestamp");
                    return Ok(());
                }
            },
        };
        let req = CreateApiKeyRequest { expires_at };
        match self.run("Creating key...", self.api.create_api_key(&plugin.id, &req)) {
            Ok(key) => {
                success("API key created. Copy it now, it won't be shown again:");
                println!("\n  {}\n", key.apikey.as_str().bold());
            }
            Err(err) => failure(err),
        }
        Ok(())
    }

    fn handle_team(&mut self, plugin: &Plugin) -> Result<()> {
        let members = match self.run("Loading team...", self.api.team_members(&plugin.id)) {
            Ok(members) => members,
            Err(err) => {
                failure(err);
                return Ok(());
            }
        };
        let is_admin = members
            .iter()
            .any(|m| m.is_current_user && m.role == TeamRole::Admin);

        for m in &members {
            let me = if m.is_current_user { " (you)" } else { "" };
            let by = m
                .added_by
                .as_deref()
                .map(|b| format!(" by {}...", b.chars().take(10).collect::<String>()))
                .unwrap_or_default();
            println!(
                "  {}{me} [{}] added via {}{by}",
                m.public_key,
                m.role,
                snake_case_to_title(&m.added_via).to_lowercase()
            );
        }
        if !is_admin {
            return Ok(());
        }

        let actions = ["Invite member", "Remove member", "Back"].map(String::from);
        match self.select("Team action", &actions)? {
            Some(0) => {
                let roles = [TeamRole::Editor, TeamRole::Viewer];
                let labels = roles.map(|r| r.to_string());
                let Some(idx) = self.select("Role", &labels)? else {
                    return Ok(());
                };
                match self.run("Creating invite...", self.api.create_invite(&plugin.id, roles[idx])) {
                    Ok(invite) => {
                        success(format!(
                            "Invite for a new {} (single use, expires {}):",
                            invite.role,
                            format_date_with_timezone(&invite.expires_at)
                        ));
                        println!("\n  {}\n", invite.link);
                    }
                    Err(err) => failure(err),
                }
            }
            Some(1) => {
                let removable: Vec<_> = members
                    .iter()
                    .filter(|m| !m.is_current_user && m.role != TeamRole::Admin)
                    .collect();
                if removable.is_empty() {
                    notice("No members can be removed.");
                    return Ok(());
                }
                let labels: Vec<String> = removable
                    .iter()
                    .map(|m| format!("{} [{}]", m.public_key, m.role))
                    .collect();
                let Some(idx) = self.select("Remove", &labels)? else {
                    return Ok(());
                };
                if self.confirm("Remove this member?")? {
                    let key = &removable[idx].public_key;
                    match self.run("Removing...", self.api.remove_team_member(&plugin.id, key)) {
                        Ok(reply) => success(reply.message),
                        Err(err) => failure(err),
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_kill_switch(&mut self, plugin: &Plugin, role: Option<MyRole>) -> Result<()> {
        if !role.is_some_and(|r| r.role.can_manage_kill_switch()) {
            notice("Only staff and admins can manage the kill switch.");
            return Ok(());
        }
        let state = match self.run("Loading kill switch...", self.api.kill_switch(&plugin.id)) {
            Ok(state) => state,
            Err(err) => {
                failure(err);
                return Ok(());
            }
        };
        let label = |on: bool| if on { "enabled".green() } else { "disabled".red() };
        println!("  Keygen:  {}", label(state.keygen_enabled));
        println!("  Keysign: {}", label(state.keysign_enabled));

        let actions = ["Toggle keygen", "Toggle keysign", "Back"].map(String::from);
        let update = match self.select("Kill switch", &actions)? {
            Some(0) => KillSwitchUpdate {
                keygen_enabled: Some(!state.keygen_enabled),
                ..Default::default()
            },
            Some(1) => KillSwitchUpdate {
                keysign_enabled: Some(!state.keysign_enabled),
                ..Default::default()
            },
            _ => return Ok(()),
        };
        if !self.confirm("Apply this change?")? {
            return Ok(());
        }
        match self.run("Updating...", self.api.set_kill_switch(&plugin.id, &update)) {
            Ok(state) => success(format!(
                "Keygen {}, keysign {}",
                if state.keygen_enabled { "enabled" } else { "disabled" },
                if state.keysign_enabled { "enabled" } else { "disabled" }
            )),
            Err(err) => failure(err),
        }
        Ok(())
    }

    fn handle_earnings(&mut self) -> Result<()> {
        let preferred = self.api.storage().currency();
        let plugin_id = self.input("Plugin id (empty for all)", "")?;
        let statuses = ["any", "pending", "completed", "failed"].map(String::from);
        let status = match self.select("Status", &statuses)? {
            Some(1) => Some(EarningStatus::Pending),
            Some(2) => Some(EarningStatus::Completed),
            Some(3) => Some(EarningStatus::Failed),
            _ => None,
        };
        let filters = EarningsFilters {
            plugin_id: Some(plugin_id.trim().to_string()).filter(|s| !s.is_empty()),
            status,
            ..Default::default()
        };

        let loaded = self.run("Loading earnings...", async {
            let summary = self.api.earnings_summary().await?;
            let page = self.api.earnings(&filters).await?;
            let rate = self.third_party.base_value(preferred).await;
            Ok::<_, ApiError>((summary, page, rate))
        });
        let (summary, page, rate) = match loaded {
            Ok(loaded) => loaded,
            Err(err) => {
                failure(err);
                return Ok(());
            }
        };
        let (currency, rate) = display_rate(preferred, rate);
        if currency != preferred {
            notice(format!(
                "No {} exchange rate available, showing amounts in USD.",
                preferred.code().to_uppercase()
            ));
        }

        println!(
            "\nTotal earnings: {} across {} transactions",
            to_value_format(summary.total_earnings * rate, currency, 2).bold(),
            summary.total_transactions
        );
        let mut by_plugin: Vec<_> = summary.earnings_by_plugin.iter().collect();
        by_plugin.sort_by(|a, b| a.0.cmp(b.0));
        for (plugin, amount) in by_plugin {
            println!("  {plugin:<24} {}", to_value_format(amount * rate, currency, 2));
        }

        println!("\nPage {}/{} ({} total)", page.page, page.total_pages.max(1), page.total);
        for e in &page.data {
            println!(
                "  {} {:<20} {} {} {:?} {}",
                format_date_with_timezone(&e.created_at),
                e.plugin_name,
                to_number_format(&e.amount.to_string(), 6),
                e.asset.to_uppercase(),
                e.status,
                e.tx_hash
            );
        }
        Ok(())
    }

    fn handle_accept_invite(&mut self) -> Result<()> {
        let link = self.input("Invite link", "")?;
        let Some((data, sig)) = parse_invite_link(&link) else {
            failure("Invalid invite link");
            return Ok(());
        };

        let info = match self.run("Validating invite...", self.api.validate_invite(&data, &sig)) {
            Ok(info) => info,
            Err(err) => {
                failure(err);
                return Ok(());
            }
        };
        println!(
            "\n{} invited you to {} as {}.",
            info.invited_by,
            info.plugin_name.as_str().bold(),
            info.role
        );
        if self.api.storage().active_vault().is_none() {
            notice("Connect a vault first to accept this invite.");
            return Ok(());
        }
        if !self.confirm("Accept invite?")? {
            return Ok(());
        }
        match self.run(
            "Accepting...",
            self.api.accept_invite(&info.plugin_id, &data, &sig),
        ) {
            Ok(_) => success("Invite accepted successfully!"),
            Err(err) => failure(err),
        }
        Ok(())
    }

    fn handle_settings(&mut self) -> Result<()> {
        let storage = self.api.storage().clone();
        let items = [
            format!("Theme ({:?})", storage.theme()),
            format!("Currency ({})", storage.currency().code().to_uppercase()),
            "Back".to_string(),
        ];
        match self.select("Settings", &items)? {
            Some(0) => {
                let theme = match storage.theme() {
                    Theme::Light => Theme::Dark,
                    Theme::Dark => Theme::Light,
                };
                match storage.set_theme(theme) {
                    Ok(()) => {
                        self.theme = prompt_theme(theme);
                        success(format!("Theme set to {theme:?}"));
                    }
                    Err(err) => failure(err),
                }
            }
            Some(1) => {
                let labels: Vec<String> = Currency::ALL
                    .iter()
                    .map(|c| format!("{} {}", c.code().to_uppercase(), c.symbol().trim()))
                    .collect();
                if let Some(idx) = self.select("Currency", &labels)? {
                    match storage.set_currency(Currency::ALL[idx]) {
                        Ok(()) => success("Currency saved"),
                        Err(err) => failure(err),
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }
}

/// `https://portal/invite?data=..&sig=..` -> `(data, sig)`.
pub fn parse_invite_link(link: &str) -> Option<(String, String)> {
    let url = reqwest::Url::parse(link.trim()).ok()?;
    let mut data = None;
    let mut sig = None;
    for (k, v) in url.query_pairs() {
        match k.as_ref() {
            "data" => data = Some(v.into_owned()),
            "sig" => sig = Some(v.into_owned()),
            _ => {}
        }
    }
    Some((data?, sig?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_invite_links() {
        let (data, sig) =
            parse_invite_link("https://portal.example/invite?data=abc%3D&sig=0xff").unwrap();
        assert_eq!(data, "abc=");
        assert_eq!(sig, "0xff");
    }

    #[tokio::test]
    async fn forgetting_the_account_prompts_again() {
        let wallet = PromptWallet::new();
        *wallet.account.lock() = Some("0xabc".into());
        assert_eq!(wallet.request_account().await, Ok("0xabc".to_string()));

        wallet.forget_account();
        assert!(wallet.account.lock().is_none());

        *wallet.account.lock() = Some("0xabc".into());
        wallet.revoke_permissions().await.unwrap();
        assert!(wallet.account.lock().is_none());
    }

    #[test]
    fn unauthorized_clears_session_and_account() {
        let storage = Arc::new(Storage::in_memory());
        storage.set_currency(Currency::Eur).unwrap();
        storage
            .add_vault(
                VaultInfo {
                    hex_chain_code: "cc".into(),
                    is_fast_vault: true,
                    public_key_ecdsa: "02ab".into(),
                    ..Default::default()
                },
                crate::auth::AuthToken {
                    access_token: "a".into(),
                    refresh_token: "r".into(),
                },
            )
            .unwrap();
        let wallet = Arc::new(PromptWallet::new());
        *wallet.account.lock() = Some("0xabc".into());

        let handler = sign_out_on_unauthorized(Arc::clone(&storage), Arc::clone(&wallet));
        handler();

        assert!(storage.active_vault().is_none());
        assert!(storage.token("02ab").is_none());
        assert_eq!(storage.currency(), Currency::Eur);
        assert!(wallet.account.lock().is_none());
    }

    #[test]
    fn rejects_incomplete_invite_links() {
        assert!(parse_invite_link("https://portal.example/invite?data=abc").is_none());
        assert!(parse_invite_link("not a link").is_none());
    }
}
