//! Command handlers.
//!
//! Each handler returns the text to print so the binary stays a thin shell
//! around `run`.

use access::Requester;
use anyhow::{anyhow, bail, Context, Result};
use auth::{IdentityProvider, Subject, TokenIdentityProvider, TokenIssuer};
use dms_model::{DocumentDraft, DocumentEdit, GrantSet, RoleId, RoleRegistry};
use doc_store::FileDocumentStore;
use documents::DocumentGateway;

use crate::cli::{Cli, Command};
use crate::settings::{DmsSettings, SettingsManager};

/// Run one command against the data directory
pub async fn run(cli: Cli, mut manager: SettingsManager) -> Result<String> {
    if let Command::Init { force } = cli.command {
        return init(&mut manager, force).await;
    }

    let settings = manager.get().clone();
    let roles = settings.role_registry();
    let issuer = issuer(cli.secret.as_deref(), &settings)?;

    if let Command::IssueToken { user, role } = &cli.command {
        let role = resolve_role(&roles, role)?;
        let token = issuer.issue(&Subject {
            user_id: *user,
            role_id: role.id,
            role_title: role.title.clone(),
        })?;
        return Ok(token);
    }

    let token = cli
        .token
        .as_deref()
        .ok_or_else(|| anyhow!("A session token is required (--token or SHIFT_DMS_TOKEN)"))?;
    let provider = TokenIdentityProvider::new(issuer, roles.clone());
    let requester = provider.authenticate(token).await?;
    tracing::debug!("Acting as user {} (role {})", requester.user_id, requester.role_id);

    let store_path = settings.storage_path(manager.data_dir());
    let store = FileDocumentStore::open(&store_path)
        .with_context(|| format!("Failed to open document store at {}", store_path.display()))?;
    let gateway = DocumentGateway::new(store, roles);

    execute(&gateway, &requester, cli.command)
}

fn execute(
    gateway: &DocumentGateway<FileDocumentStore>,
    requester: &Requester,
    command: Command,
) -> Result<String> {
    match command {
        Command::Create {
            title,
            content,
            access,
            roles,
        } => {
            let record = gateway.create(
                requester,
                DocumentDraft {
                    title,
                    content,
                    owner_id: requester.user_id,
                    access,
                    roles: grant_set(&roles),
                },
            )?;
            Ok(serde_json::to_string_pretty(&record)?)
        }
        Command::Show { id } => {
            let opened = gateway.open(requester, id)?;
            Ok(serde_json::to_string_pretty(&opened)?)
        }
        Command::List => {
            let listing: Vec<String> = gateway
                .list(requester)?
                .into_iter()
                .map(|opened| {
                    format!(
                        "{}\t{}\t{:?}\t{}",
                        opened.record.document.id,
                        opened.record.document.access,
                        opened.access,
                        opened.record.document.title
                    )
                })
                .collect();
            Ok(listing.join("\n"))
        }
        Command::Update {
            id,
            title,
            content,
            access,
            roles,
        } => {
            let current = gateway.open(requester, id)?.record;
            let previous = current.document.snapshot();
            let edit = DocumentEdit {
                title: title.unwrap_or(previous.title.clone()),
                content: content.unwrap_or(previous.content.clone()),
                access: access.unwrap_or(previous.access),
                roles: roles.as_deref().map(grant_set).unwrap_or(current.grants),
            };
            let record = gateway.update(requester, id, &previous, edit)?;
            Ok(serde_json::to_string_pretty(&record)?)
        }
        Command::Delete { id } => {
            gateway.delete(requester, id)?;
            Ok(format!("Deleted document {}", id))
        }
        Command::Init { .. } | Command::IssueToken { .. } => {
            bail!("Command does not act on documents")
        }
    }
}

async fn init(manager: &mut SettingsManager, force: bool) -> Result<String> {
    if manager.exists() && !force {
        bail!(
            "Settings already exist at {} (use --force to overwrite)",
            manager.settings_path().display()
        );
    }

    let settings = manager.reset().await?.clone();
    let store_path = settings.storage_path(manager.data_dir());
    FileDocumentStore::open(&store_path)?;

    tracing::info!("Initialized data directory {:?}", manager.data_dir());
    Ok(format!("Initialized {}", manager.data_dir().display()))
}

fn issuer(secret: Option<&str>, settings: &DmsSettings) -> Result<TokenIssuer> {
    let secret = secret
        .filter(|s| !s.is_empty())
        .ok_or_else(|| anyhow!("SHIFT_DMS_SECRET_KEY is not set"))?;
    Ok(TokenIssuer::new(secret.as_bytes())
        .with_ttl(chrono::Duration::days(settings.auth.token_ttl_days)))
}

fn resolve_role<'a>(roles: &'a RoleRegistry, name: &str) -> Result<&'a dms_model::Role> {
    let by_id = name.parse::<RoleId>().ok().and_then(|id| roles.get(id));
    by_id
        .or_else(|| roles.find_by_title(name))
        .ok_or_else(|| anyhow!("Unknown role: {}", name))
}

fn grant_set(roles: &[u64]) -> GrantSet {
    GrantSet::read_for(roles.iter().copied().map(RoleId))
}
