mod gemini;
mod server;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use derma_core::{
    Analyzer, Briefing, Catalog, FunctionCategory, IngredientId, MemoryCatalog, PairReport,
    ScanReport, SkinType, UserProfile, Verdict, evaluate, parse_reply,
};
use derma_store::{DataDir, Settings, Store, import_builtin, import_catalog, read_catalog};
use rmcp::{ServiceExt, transport::stdio};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::gemini::GeminiClient;

#[derive(Parser)]
#[command(name = "derma", about = "Skincare ingredient safety advisor and MCP server")]
struct Cli {
    /// Data directory (default: $DERMA_DATA_DIR, then ~/.derma)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Skin type: normal, oily, dry, sensitive or acne-prone
    #[arg(long, global = true)]
    skin: Option<String>,

    /// Pregnant or breastfeeding; `--pregnant=false` overrides config.toml
    #[arg(
        long,
        global = true,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    pregnant: Option<bool>,

    /// Print machine-readable JSON
    #[arg(long, global = true)]
    json: bool,

    /// Enable verbose debug output
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start MCP server on stdio transport
    Serve,

    /// Import a catalog TOML file (the built-in catalog when no path is given)
    Import {
        /// Catalog file path
        path: Option<PathBuf>,
    },

    /// List catalog ingredients
    List {
        /// Only this function category, e.g. Oil or Perfume
        #[arg(long)]
        category: Option<String>,
    },

    /// Show one ingredient and how it suits your profile
    Show {
        /// Canonical (INCI) name
        name: String,
    },

    /// Check whether two ingredients can be used together
    Check { first: String, second: String },

    /// Analyze a product's ingredient list
    Scan {
        #[command(flatten)]
        source: ProductArgs,

        /// Do not record the result in scan history
        #[arg(long)]
        no_log: bool,
    },

    /// Show recent scans
    History {
        /// Number of scans (default from config, else 10)
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Print the assistant briefing for a product
    Brief {
        #[command(flatten)]
        source: ProductArgs,
    },

    /// Ask the assistant follow-up questions about a product
    Chat {
        #[command(flatten)]
        source: ProductArgs,
    },
}

#[derive(clap::Args)]
struct ProductArgs {
    /// Ingredient names; comma-separated lists are split
    ingredients: Vec<String>,

    /// Read the ingredient list from a label photo instead
    #[arg(long, conflicts_with = "ingredients")]
    image: Option<PathBuf>,

    /// An ingredient already in your routine, checked against every match
    #[arg(long)]
    routine: Option<String>,
}

/// Everything a command needs that comes from the data directory.
struct Session {
    dir: DataDir,
    settings: Settings,
    profile: UserProfile,
}

impl Session {
    fn open(cli: &Cli) -> Result<Self> {
        let dir = DataDir::open(cli.data_dir.as_deref()).context("failed to open data directory")?;
        let settings = dir
            .settings()
            .with_context(|| format!("failed to read {}", dir.config_path().display()))?;
        let profile = resolve_profile(cli, &settings)?;
        tracing::debug!(root = %dir.root().display(), profile = %profile.describe(), "session");
        Ok(Self {
            dir,
            settings,
            profile,
        })
    }

    /// Open the store, seeding the built-in catalog on first use.
    fn store(&self) -> Result<Store> {
        let store = self.dir.open_store().context("failed to open database")?;
        if store.ingredient_count()? == 0 {
            tracing::info!("empty catalog, importing built-in data");
            import_builtin(&store).context("failed to import built-in catalog")?;
        }
        Ok(store)
    }

    fn analyzer<'a>(&self, catalog: &'a MemoryCatalog) -> Analyzer<'a, MemoryCatalog> {
        Analyzer::new(catalog, self.profile).match_aliases(self.settings.scan.match_aliases)
    }
}

/// Flags override `[profile]` in config.toml.
fn resolve_profile(cli: &Cli, settings: &Settings) -> Result<UserProfile> {
    let configured = settings
        .profile()
        .context("invalid [profile] in config.toml")?;
    let skin_type = match &cli.skin {
        Some(code) => code.parse::<SkinType>()?,
        None => configured.skin_type,
    };
    Ok(UserProfile::new(
        skin_type,
        cli.pregnant.unwrap_or(configured.is_pregnant),
    ))
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Serve => cmd_serve(&cli).await,
        Commands::Import { path } => cmd_import(&cli, path.as_deref()),
        Commands::List { category } => cmd_list(&cli, category.as_deref()),
        Commands::Show { name } => cmd_show(&cli, name),
        Commands::Check { first, second } => cmd_check(&cli, first, second),
        Commands::Scan { source, no_log } => cmd_scan(&cli, source, *no_log).await,
        Commands::History { limit } => cmd_history(&cli, *limit),
        Commands::Brief { source } => cmd_brief(&cli, source).await,
        Commands::Chat { source } => cmd_chat(&cli, source).await,
    }
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn resolve(catalog: &MemoryCatalog, name: &str) -> Result<IngredientId> {
    match catalog.find_by_name(name) {
        Some(ingredient) => Ok(ingredient.id),
        None => bail!("unknown ingredient '{name}' (see `derma list`)"),
    }
}

/// Names from the command line, or from a label photo via Gemini.
async fn detected_names(session: &Session, source: &ProductArgs) -> Result<Vec<String>> {
    if let Some(path) = &source.image {
        let image =
            std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        let client = GeminiClient::from_env(&session.settings.assistant)?;
        return client
            .extract_ingredients(&image, gemini::mime_type_for(path))
            .await
            .context("ingredient extraction failed");
    }

    let names: Vec<String> = source
        .ingredients
        .iter()
        .flat_map(|arg| parse_reply(arg))
        .collect();
    if names.is_empty() {
        bail!("no ingredients given: pass names or --image");
    }
    Ok(names)
}

async fn analyze_product(
    session: &Session,
    store: &Store,
    source: &ProductArgs,
) -> Result<(Vec<String>, ScanReport)> {
    let catalog = store.load_catalog().context("failed to load catalog")?;
    let detected = detected_names(session, source).await?;
    let routine = source
        .routine
        .as_deref()
        .map(|name| resolve(&catalog, name))
        .transpose()?;
    let report = session.analyzer(&catalog).cross_reference(&detected, routine);
    Ok((detected, report))
}

async fn cmd_serve(cli: &Cli) -> Result<()> {
    let session = Session::open(cli)?;
    let store = session.store()?;
    tracing::info!("starting MCP server on {}", session.dir.root().display());

    let server = server::DermaServer::new(store, session.settings, session.profile)
        .map_err(|e| anyhow::anyhow!("{e}"))?;
    let service = server
        .serve(stdio())
        .await
        .context("failed to start MCP server")?;
    service.waiting().await?;
    Ok(())
}

fn cmd_import(cli: &Cli, path: Option<&Path>) -> Result<()> {
    let session = Session::open(cli)?;
    let store = session.dir.open_store().context("failed to open database")?;

    let report = match path {
        Some(path) => {
            let file = read_catalog(path)
                .with_context(|| format!("failed to read catalog {}", path.display()))?;
            let report = import_catalog(&store, &file).context("import failed")?;
            store.set_metadata("catalog_source", &path.display().to_string())?;
            report
        }
        None => import_builtin(&store).context("import failed")?,
    };

    if cli.json {
        return print_json(&report);
    }
    println!(
        "ingredients: {} new, {} updated",
        report.ingredients_inserted, report.ingredients_updated
    );
    println!(
        "interactions: {} added, {} already known",
        report.rules_inserted, report.rules_skipped
    );
    for pair in &report.rules_missing {
        println!("skipped {pair}: ingredient not in catalog");
    }
    println!(
        "catalog: {} ingredients, {} interactions",
        store.ingredient_count()?,
        store.interaction_count()?
    );
    Ok(())
}

fn cmd_list(cli: &Cli, category: Option<&str>) -> Result<()> {
    let session = Session::open(cli)?;
    let catalog = session.store()?.load_catalog().context("failed to load catalog")?;
    let category = category.map(FunctionCategory::from_label);

    let ingredients: Vec<_> = catalog
        .list_all()
        .iter()
        .filter(|i| category.is_none_or(|c| i.category == c))
        .collect();

    if cli.json {
        return print_json(&ingredients);
    }
    for i in &ingredients {
        println!(
            "{:<32} {:<12} safety {}  comedogenic {}",
            i.inci_name, i.category, i.safety_rating, i.comedogenic_rating
        );
    }
    println!("({} ingredients)", ingredients.len());
    Ok(())
}

fn cmd_show(cli: &Cli, name: &str) -> Result<()> {
    let session = Session::open(cli)?;
    let catalog = session.store()?.load_catalog().context("failed to load catalog")?;

    let ingredient = catalog.find_by_name(name);
    let verdict = match ingredient {
        Some(i) => Verdict::Assessed(evaluate(i, &session.profile)),
        None => Verdict::unknown(),
    };

    if cli.json {
        return print_json(&serde_json::json!({
            "ingredient": ingredient,
            "profile": session.profile,
            "verdict": verdict,
        }));
    }

    match ingredient {
        Some(i) => {
            println!("{}", i.inci_name);
            if !i.aliases.is_empty() {
                println!("  also:        {}", i.aliases.join(", "));
            }
            println!("  category:    {}", i.category);
            println!("  safety:      {}", i.safety_rating);
            println!("  comedogenic: {}/5", i.comedogenic_rating);
            match i.pregnancy_safe {
                Some(true) => println!("  pregnancy:   considered safe"),
                Some(false) => println!("  pregnancy:   avoid"),
                None => {}
            }
            if !i.mechanism.is_empty() {
                println!("  {}", i.mechanism);
            }
        }
        None => println!("{}", name.trim()),
    }
    println!();
    println!("For {}:", session.profile.describe());
    print_verdict(&verdict);
    Ok(())
}

fn cmd_check(cli: &Cli, first: &str, second: &str) -> Result<()> {
    let session = Session::open(cli)?;
    let catalog = session.store()?.load_catalog().context("failed to load catalog")?;
    let a = resolve(&catalog, first)?;
    let b = resolve(&catalog, second)?;

    let report = session.analyzer(&catalog).check_pair(a, b);
    if cli.json {
        return print_json(&report);
    }
    print_pair(&report);
    Ok(())
}

async fn cmd_scan(cli: &Cli, source: &ProductArgs, no_log: bool) -> Result<()> {
    let session = Session::open(cli)?;
    let store = session.store()?;
    let (detected, report) = analyze_product(&session, &store, source).await?;

    if !no_log {
        let routine = report.routine.as_ref().map(|r| r.display_name());
        store
            .append_scan(
                &detected,
                routine.as_deref(),
                &session.profile,
                report.summary.label(),
            )
            .context("failed to record scan")?;
    }

    if cli.json {
        return print_json(&report);
    }
    print_scan(&report);
    Ok(())
}

fn cmd_history(cli: &Cli, limit: Option<usize>) -> Result<()> {
    let session = Session::open(cli)?;
    let store = session.dir.open_store().context("failed to open database")?;
    let limit = limit.unwrap_or(session.settings.scan.history_limit);
    let scans = store.recent_scans(limit).context("failed to read history")?;

    if cli.json {
        return print_json(&scans);
    }
    if scans.is_empty() {
        println!("(no scans yet)");
        return Ok(());
    }
    for scan in &scans {
        let routine = scan
            .routine
            .as_deref()
            .map(|r| format!(" with {r}"))
            .unwrap_or_default();
        println!(
            "{}  {:<8} {}{}: {}",
            scan.created_at,
            scan.label,
            scan.profile.describe(),
            routine,
            scan.detected.join(", ")
        );
    }
    Ok(())
}

async fn cmd_brief(cli: &Cli, source: &ProductArgs) -> Result<()> {
    let session = Session::open(cli)?;
    let store = session.store()?;
    let (detected, report) = analyze_product(&session, &store, source).await?;
    let briefing = Briefing::from_scan(&detected, &report);

    if cli.json {
        return print_json(&serde_json::json!({
            "briefing": briefing.render(),
            "findings": briefing.findings,
            "summary": report.summary,
        }));
    }
    println!("{}", briefing.render());
    Ok(())
}

async fn cmd_chat(cli: &Cli, source: &ProductArgs) -> Result<()> {
    let session = Session::open(cli)?;
    let client = GeminiClient::from_env(&session.settings.assistant)?;
    let store = session.store()?;
    let (detected, report) = analyze_product(&session, &store, source).await?;

    print_scan(&report);
    println!();
    eprintln!("Ask about this product. An empty line or 'quit' exits.");

    let mut history = Briefing::from_scan(&detected, &report).seed_history();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        eprint!("> ");
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let message = line.trim();
        if message.is_empty() || message.eq_ignore_ascii_case("quit") {
            break;
        }

        match client.chat(&history, message).await {
            Ok(reply) => {
                println!("{}\n", reply.trim());
                history.push(derma_core::ChatTurn::user(message));
                history.push(derma_core::ChatTurn::model(reply));
            }
            Err(e) => eprintln!("assistant unavailable: {e:#}"),
        }
    }
    Ok(())
}

// --- Text rendering ---

fn print_verdict(verdict: &Verdict) {
    println!("  {}", verdict.label());
    for line in verdict.explanation().lines() {
        println!("    {line}");
    }
}

fn print_pair(report: &PairReport) {
    println!("Profile: {}", report.profile.describe());
    for side in [&report.first, &report.second] {
        println!("{}:", side.ingredient.display_name());
        print_verdict(&side.verdict);
    }
    match &report.interaction {
        Some(rule) => {
            println!("Interaction: {} ({})", rule.kind, rule.severity);
            println!("  {}", rule.advice);
            if let Some(citation) = &rule.citation {
                println!("  Source: {citation}");
            }
        }
        None => println!("Interaction: none known, compatible"),
    }
}

fn print_scan(report: &ScanReport) {
    println!("Profile: {}", report.profile.describe());
    let matched = report.matched_names();
    println!(
        "Matched {} of {}: {}",
        matched.len(),
        matched.len() + report.unmatched.len(),
        if matched.is_empty() {
            "-".to_string()
        } else {
            matched.join(", ")
        }
    );
    if !report.unmatched.is_empty() {
        println!("Not in catalog: {}", report.unmatched.join(", "));
    }

    if !report.personal_risks.is_empty() {
        println!("Personal risks:");
        for risk in &report.personal_risks {
            println!("  - {} ({})", risk.ingredient.display_name(), risk.risk);
            for line in risk.explanation.lines() {
                println!("      {line}");
            }
        }
    }

    if let Some(routine) = &report.routine {
        if report.interaction_risks.is_empty() {
            println!("No conflicts with {}.", routine.display_name());
        } else {
            println!("Interactions with {}:", routine.display_name());
            for risk in &report.interaction_risks {
                println!(
                    "  - {}: {} ({}) {}",
                    risk.ingredient.display_name(),
                    risk.kind,
                    risk.severity,
                    risk.advice
                );
            }
        }
    }

    println!("Result: {}", report.summary.label());
}
