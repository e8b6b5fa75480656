// Portal endpoints: one method per backend route, all going through the
// authenticated pipeline in `api`.

use serde_json::json;

use crate::api::ApiClient;
use crate::auth::{self, AuthToken};
use crate::error::ApiError;
use crate::models::{
    AcceptedInvite, AuthRequest, CreateApiKeyRequest, EarningsFilters, EarningsPage,
    EarningsSummary, Invite, InviteInfo, KillSwitch, KillSwitchUpdate, Message, MyRole, Plugin,
    PluginApiKey, PluginPricing, PluginUpdate, TeamMember, TeamRole,
};

/// Server message for an unknown plugin id.
const PLUGIN_NOT_FOUND: &str = "plugin not found";

impl ApiClient {
    // -- auth --

    /// Exchange a signed sign-in message for a token pair.
    pub async fn issue_token(&self, req: &AuthRequest) -> Result<AuthToken, ApiError> {
        self.post("/auth", req).await
    }

    /// Revoke the token pair on the server.
    pub async fn revoke_token(&self, access_token: &str) -> Result<(), ApiError> {
        let token_id = auth::token_id(access_token)
            .ok_or_else(|| ApiError::InvalidResponse("access token carries no token_id".into()))?;
        let _: serde_json::Value = self.delete(&format!("/auth/tokens/{token_id}")).await?;
        Ok(())
    }

    // -- plugins --

    pub async fn list_plugins(&self) -> Result<Vec<Plugin>, ApiError> {
        self.get("/plugins").await
    }

    /// `None` when the server doesn't know the plugin.
    pub async fn get_plugin(&self, id: &str) -> Result<Option<Plugin>, ApiError> {
        match self.get(&format!("/plugins/{id}")).await {
            Ok(plugin) => Ok(Some(plugin)),
            Err(ApiError::Server { message, .. }) if message == PLUGIN_NOT_FOUND => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Save edited fields with the signature approving them. The signed
    /// message is sent exactly as signed, camelCase keys included.
    pub async fn update_plugin(&self, id: &str, update: &PluginUpdate) -> Result<Plugin, ApiError> {
        let body = json!({
            "title": update.title,
            "description": update.description,
            "server_endpoint": update.server_endpoint,
            "signature": update.signature,
            "signed_message": update.signed_message,
        });
        self.put_verbatim(&format!("/plugins/{id}"), body).await
    }

    pub async fn plugin_pricings(&self, plugin_id: &str) -> Result<Vec<PluginPricing>, ApiError> {
        self.get(&format!("/plugins/{plugin_id}/pricings")).await
    }

    pub async fn my_role(&self, plugin_id: &str) -> Result<MyRole, ApiError> {
        self.get(&format!("/plugins/{plugin_id}/my-role")).await
    }

    // -- api keys --

    pub async fn api_keys(&self, plugin_id: &str) -> Result<Vec<PluginApiKey>, ApiError> {
        self.get(&format!("/plugins/{plugin_id}/api-keys")).await
    }

    /// The returned key holds the full secret; it is never shown again.
    pub async fn create_api_key(
        &self,
        plugin_id: &str,
        req: &CreateApiKeyRequest,
    ) -> Result<PluginApiKey, ApiError> {
        self.post(&format!("/plugins/{plugin_id}/api-keys"), req).await
    }

    pub async fn set_api_key_status(
        &self,
        plugin_id: &str,
        key_id: &str,
        status: i32,
    ) -> Result<PluginApiKey, ApiError> {
        self.put(
            &format!("/plugins/{plugin_id}/api-keys/{key_id}"),
            &json!({ "status": status }),
        )
        .await
    }

    /// Expires the key.
    pub async fn delete_api_key(&self, plugin_id: &str, key_id: &str) -> Result<PluginApiKey, ApiError> {
        self.delete(&format!("/plugins/{plugin_id}/api-keys/{key_id}")).await
    }

    // -- earnings --

    /// One page of earnings. Status and type are filtered locally, the server
    /// only filters by plugin and date.
    pub async fn earnings(&self, filters: &EarningsFilters) -> Result<EarningsPage, ApiError> {
        let mut query: Vec<(&str, String)> = Vec::new();
        if let Some(plugin_id) = &filters.plugin_id {
            query.push(("pluginId", plugin_id.clone()));
        }
        if let Some(from) = &filters.date_from {
            query.push(("dateFrom", from.clone()));
        }
        if let Some(to) = &filters.date_to {
            query.push(("dateTo", to.clone()));
        }
        query.push(("page", filters.page.unwrap_or(1).to_string()));
        query.push(("limit", filters.limit.unwrap_or(10).to_string()));

        let mut page: EarningsPage = self.get_with_query("/earnings", &query).await?;
        if let Some(status) = filters.status {
            page.data.retain(|e| e.status == status);
        }
        if let Some(kind) = filters.kind {
            page.data.retain(|e| e.kind == kind);
        }
        Ok(page)
    }

    pub async fn earnings_summary(&self) -> Result<EarningsSummary, ApiError> {
        self.get("/earnings/summary").await
    }

    // -- team --

    pub async fn team_members(&self, plugin_id: &str) -> Result<Vec<TeamMember>, ApiError> {
        self.get(&format!("/plugins/{plugin_id}/team")).await
    }

    pub async fn create_invite(&self, plugin_id: &str, role: TeamRole) -> Result<Invite, ApiError> {
        self.post(
            &format!("/plugins/{plugin_id}/team/invite"),
            &json!({ "role": role }),
        )
        .await
    }

    /// Public: works without a session.
    pub async fn validate_invite(&self, data: &str, sig: &str) -> Result<InviteInfo, ApiError> {
        self.get_with_query(
            "/invite/validate",
            &[("data", data.to_string()), ("sig", sig.to_string())],
        )
        .await
    }

    pub async fn accept_invite(
        &self,
        plugin_id: &str,
        data: &str,
        signature: &str,
    ) -> Result<AcceptedInvite, ApiError> {
        self.post(
            &format!("/plugins/{plugin_id}/team/accept"),
            &json!({ "data": data, "signature": signature }),
        )
        .await
    }

    pub async fn remove_team_member(&self, plugin_id: &str, public_key: &str) -> Result<Message, ApiError> {
        let key = urlencoding::encode(public_key);
        self.delete(&format!("/plugins/{plugin_id}/team/{key}")).await
    }

    // -- kill switch --

    pub async fn kill_switch(&self, plugin_id: &str) -> Result<KillSwitch, ApiError> {
        self.get(&format!("/plugins/{plugin_id}/kill-switch")).await
    }

    pub async fn set_kill_switch(
        &self,
        plugin_id: &str,
        update: &KillSwitchUpdate,
    ) -> Result<KillSwitch, ApiError> {
        self.put(&format!("/plugins/{plugin_id}/kill-switch"), update).await
    }
}
