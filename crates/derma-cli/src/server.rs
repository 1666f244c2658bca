use std::sync::Arc;

use derma_core::{
    Analyzer, Briefing, Catalog, FunctionCategory, IngredientId, MemoryCatalog, SkinType,
    UserProfile, Verdict, evaluate,
};
use derma_store::{Settings, Store};
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::*;
use rmcp::{ErrorData as McpError, ServerHandler, tool, tool_handler, tool_router};
use schemars::JsonSchema;
use serde::Deserialize;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct DermaServer {
    state: Arc<Mutex<ServerState>>,
    tool_router: ToolRouter<Self>,
}

struct ServerState {
    store: Store,
    catalog: MemoryCatalog,
    settings: Settings,
    /// Profile used when a request does not name one.
    profile: UserProfile,
}

impl DermaServer {
    pub fn new(
        store: Store,
        settings: Settings,
        profile: UserProfile,
    ) -> std::result::Result<Self, String> {
        let catalog = store
            .load_catalog()
            .map_err(|e| format!("failed to load catalog: {e}"))?;
        tracing::info!(ingredients = catalog.len(), rules = catalog.rule_count(), "catalog ready");
        Ok(Self {
            state: Arc::new(Mutex::new(ServerState {
                store,
                catalog,
                settings,
                profile,
            })),
            tool_router: Self::tool_router(),
        })
    }
}

impl ServerState {
    fn profile_for(
        &self,
        skin_type: Option<&str>,
        pregnant: Option<bool>,
    ) -> Result<UserProfile, McpError> {
        let skin_type = match skin_type {
            Some(code) => code
                .parse::<SkinType>()
                .map_err(|e| McpError::invalid_params(e.to_string(), None))?,
            None => self.profile.skin_type,
        };
        Ok(UserProfile::new(
            skin_type,
            pregnant.unwrap_or(self.profile.is_pregnant),
        ))
    }

    fn resolve(&self, name: &str) -> Result<IngredientId, McpError> {
        self.catalog.find_by_name(name).map(|i| i.id).ok_or_else(|| {
            McpError::invalid_params(
                format!("unknown ingredient '{name}'; see derma_list_ingredients"),
                None,
            )
        })
    }

    fn analyzer(&self, profile: UserProfile) -> Analyzer<'_, MemoryCatalog> {
        Analyzer::new(&self.catalog, profile).match_aliases(self.settings.scan.match_aliases)
    }
}

fn json_result(value: &impl serde::Serialize) -> CallToolResult {
    CallToolResult::success(vec![Content::text(
        serde_json::to_string_pretty(value).unwrap_or_default(),
    )])
}

// --- Tool parameter types ---

#[derive(Debug, Deserialize, JsonSchema)]
struct CheckPairRequest {
    /// Canonical (INCI) name of the first ingredient, e.g. "Retinol"
    first: String,
    /// Canonical (INCI) name of the second ingredient, e.g. "Ascorbic Acid"
    second: String,
    /// Skin type: Normal, Oily, Dry, Sensitive or Acne-Prone. Defaults to the configured profile.
    skin_type: Option<String>,
    /// Pregnant or breastfeeding. Defaults to the configured profile.
    pregnant: Option<bool>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct ScanRequest {
    /// Ingredient names as read from a product label
    ingredients: Vec<String>,
    /// Canonical name of an ingredient already in the user's routine
    routine: Option<String>,
    skin_type: Option<String>,
    pregnant: Option<bool>,
    /// Append the result to the scan history (default true)
    record: Option<bool>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct EvaluateRequest {
    /// Canonical (INCI) name of the ingredient
    ingredient: String,
    skin_type: Option<String>,
    pregnant: Option<bool>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct ListRequest {
    /// Only list ingredients in this function category, e.g. "Oil" or "Perfume"
    category: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct HistoryRequest {
    /// Number of scans to return, newest first
    limit: Option<usize>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct BriefingRequest {
    /// Ingredient names as read from a product label
    ingredients: Vec<String>,
    routine: Option<String>,
    skin_type: Option<String>,
    pregnant: Option<bool>,
}

#[tool_router]
impl DermaServer {
    #[tool(
        description = "Check whether two skincare ingredients can be used together, and how each suits the user's skin profile. Returns the curated interaction rule (CONFLICT, CAUTION or SYNERGY with severity and advice) or null when none is known, which means compatible."
    )]
    async fn derma_check_pair(
        &self,
        Parameters(req): Parameters<CheckPairRequest>,
    ) -> Result<CallToolResult, McpError> {
        let state = self.state.lock().await;
        let profile = state.profile_for(req.skin_type.as_deref(), req.pregnant)?;
        let a = state.resolve(&req.first)?;
        let b = state.resolve(&req.second)?;

        let report = state.analyzer(profile).check_pair(a, b);
        Ok(json_result(&report))
    }

    #[tool(
        description = "Analyze a product's ingredient list for the user's skin profile. Names are matched against the catalog by case-insensitive substring (longest catalog name wins). Reports personal risks, interactions with an optional routine ingredient, unmatched names and an overall SAFE / UNSAFE / NO_MATCH summary. The result is logged to scan history unless record is false; a failed write is an error."
    )]
    async fn derma_scan(
        &self,
        Parameters(req): Parameters<ScanRequest>,
    ) -> Result<CallToolResult, McpError> {
        let state = self.state.lock().await;
        let profile = state.profile_for(req.skin_type.as_deref(), req.pregnant)?;
        let routine = req.routine.as_deref().map(|r| state.resolve(r)).transpose()?;

        let report = state
            .analyzer(profile)
            .cross_reference(&req.ingredients, routine);

        if req.record.unwrap_or(true) {
            let routine_name = report.routine.as_ref().map(|r| r.display_name());
            state
                .store
                .append_scan(
                    &req.ingredients,
                    routine_name.as_deref(),
                    &profile,
                    report.summary.label(),
                )
                .map_err(|e| {
                    tracing::error!("failed to log scan: {e}");
                    McpError::internal_error(format!("scan not recorded: {e}"), None)
                })?;
        }

        Ok(json_result(&report))
    }

    #[tool(
        description = "Evaluate one ingredient against the user's skin profile. Returns SAFE, WARNING or DANGER with an explanation, or status \"unknown\" when the ingredient is not in the catalog."
    )]
    async fn derma_evaluate(
        &self,
        Parameters(req): Parameters<EvaluateRequest>,
    ) -> Result<CallToolResult, McpError> {
        let state = self.state.lock().await;
        let profile = state.profile_for(req.skin_type.as_deref(), req.pregnant)?;

        let (ingredient, verdict) = match state.catalog.find_by_name(&req.ingredient) {
            Some(ingredient) => (
                Some(ingredient),
                Verdict::Assessed(evaluate(ingredient, &profile)),
            ),
            None => (None, Verdict::unknown()),
        };

        let result = serde_json::json!({
            "query": req.ingredient,
            "profile": profile,
            "ingredient": ingredient,
            "verdict": verdict,
        });
        Ok(json_result(&result))
    }

    #[tool(
        description = "List catalog ingredients with their category, safety rating (1 safest, 8+ highest concern), comedogenic rating (0-5) and common names."
    )]
    async fn derma_list_ingredients(
        &self,
        Parameters(req): Parameters<ListRequest>,
    ) -> Result<CallToolResult, McpError> {
        let state = self.state.lock().await;
        let category = req.category.as_deref().map(FunctionCategory::from_label);

        let ingredients: Vec<_> = state
            .catalog
            .list_all()
            .iter()
            .filter(|i| category.is_none_or(|c| i.category == c))
            .collect();

        let result = serde_json::json!({
            "count": ingredients.len(),
            "ingredients": ingredients,
        });
        Ok(json_result(&result))
    }

    #[tool(description = "Recent product scans, newest first.")]
    async fn derma_history(
        &self,
        Parameters(req): Parameters<HistoryRequest>,
    ) -> Result<CallToolResult, McpError> {
        let state = self.state.lock().await;
        let limit = req.limit.unwrap_or(state.settings.scan.history_limit);
        let scans = state
            .store
            .recent_scans(limit)
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(json_result(&scans))
    }

    #[tool(
        description = "Build the dermatology-assistant briefing for a scanned product: the ingredient list, the user's profile and every rule-engine finding. Use it as context before answering follow-up questions about the product."
    )]
    async fn derma_briefing(
        &self,
        Parameters(req): Parameters<BriefingRequest>,
    ) -> Result<CallToolResult, McpError> {
        let state = self.state.lock().await;
        let profile = state.profile_for(req.skin_type.as_deref(), req.pregnant)?;
        let routine = req.routine.as_deref().map(|r| state.resolve(r)).transpose()?;

        let report = state
            .analyzer(profile)
            .cross_reference(&req.ingredients, routine);
        let briefing = Briefing::from_scan(&req.ingredients, &report);

        let result = serde_json::json!({
            "briefing": briefing.render(),
            "findings": briefing.findings,
            "summary": report.summary,
        });
        Ok(json_result(&result))
    }
}

#[tool_handler]
impl ServerHandler for DermaServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Skincare ingredient safety and interaction advisor backed by a curated catalog.\n\n\
                 - derma_scan: analyze a product's ingredient list; pass the user's current active as routine.\n\
                 - derma_check_pair: can two ingredients be layered?\n\
                 - derma_evaluate: is one ingredient suitable for this skin profile?\n\
                 - derma_list_ingredients: catalog contents, for exact names.\n\
                 - derma_history: recent scans.\n\
                 - derma_briefing: context for follow-up questions about a scanned product.\n\n\
                 Verdicts come from fixed rules. A pregnancy DANGER for retinoids is absolute: never soften it. \
                 Ingredients missing from the catalog are unverified, not safe."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}
