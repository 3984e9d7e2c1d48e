use anyhow::{Context, Result};
use bframe::logging::{init_logging, init_logging_with_config, LogConfig};
use bframe::{
    abort, AppConfig, Dispatcher, HandlerResponse, HandlerResult, RequestContext, Resource,
    RouteError,
};
use clap::Parser;
use http::Method;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// bframe demo application
#[derive(Parser, Debug)]
#[command(name = "bframe", version, about, long_about = None)]
struct Cli {
    /// YAML configuration file
    #[arg(short, long, env = "BFRAME_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on (overrides the config file)
    #[arg(long)]
    address: Option<String>,

    /// Port to listen on (overrides the config file)
    #[arg(short, long)]
    port: Option<u16>,

    /// Directory served under the static prefix
    #[arg(long)]
    static_dir: Option<PathBuf>,

    /// trace, debug, info, warn or error
    #[arg(long)]
    log_level: Option<String>,
}

fn index(_ctx: &mut RequestContext) -> HandlerResult {
    Ok("hello world".into())
}

fn login(ctx: &mut RequestContext) -> HandlerResult {
    let (Some(user), Some(pwd)) = (ctx.form("user"), ctx.form("pwd")) else {
        return Ok(json!({"code": 200, "status": false, "msg": "incomplete credentials"}).into());
    };
    if user != "admin" || pwd != "admin" {
        return Ok(json!({"code": 200, "status": false, "msg": "wrong user or password"}).into());
    }
    Ok(json!({"code": 200, "status": true, "msg": "logged in"}).into())
}

fn admin(ctx: &mut RequestContext) -> HandlerResult {
    if ctx.get("user").map_or(true, |user| user.is_null()) {
        return abort(401);
    }
    Ok(json!({"code": 200, "status": true, "msg": "admin data"}).into())
}

fn user(ctx: &mut RequestContext) -> HandlerResult {
    let id: u64 = ctx.param("id").unwrap_or_default().parse()?;
    Ok(json!({"id": id}).into())
}

fn before_auth(ctx: &mut RequestContext) -> Result<(), bframe::HandlerError> {
    let user = ctx.query("user").map(str::to_owned);
    ctx.set("user", user);
    Ok(())
}

fn unauthorized(_ctx: &RequestContext) -> HandlerResponse {
    json!({"code": 401, "status": false, "msg": "please log in first"}).into()
}

/// `GET` and `DELETE` on one object.
struct Items;

impl Resource for Items {
    fn methods(&self) -> Vec<Method> {
        vec![Method::GET, Method::DELETE]
    }

    fn handle(&self, method: &Method, ctx: &mut RequestContext) -> HandlerResult {
        let name = ctx.param("name").unwrap_or_default();
        match *method {
            Method::GET => Ok(json!({"item": name}).into()),
            Method::DELETE => Ok(HandlerResponse::status_only(204)),
            _ => abort(405),
        }
    }
}

fn build_app(config: &AppConfig) -> Result<Dispatcher, RouteError> {
    let app = Dispatcher::from_config(config);
    app.get("/", index)?;
    app.get("/index", index)?;
    app.post("/login", login)?;
    app.get("/admin", admin)?;
    app.get("/users/<int:id>", user)?;
    app.register_resource("/items/<str:name>", Items)?;
    app.add_before_handle(before_auth);
    app.add_error_handle(401, unauthorized);
    Ok(app)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let _log_guard = match &cli.log_level {
        Some(level) => init_logging(level)?,
        None => init_logging_with_config(&LogConfig::from_env())?,
    };

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(address) = cli.address {
        config.address = address;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(dir) = cli.static_dir {
        config.static_folder = dir.to_string_lossy().into_owned();
    }

    may::config().set_stack_size(config.stack_size);
    info!(
        address = %config.address,
        port = config.port,
        static_url = %config.static_url,
        static_folder = %config.static_folder,
        stack_size = config.stack_size,
        "Starting bframe demo"
    );

    let app = Arc::new(build_app(&config).context("failed to register routes")?);
    app.run(&config.address, config.port)
}
