//! Walks the dashboard flows against the fake Atlassian backend.
//! $ cargo run --bin offline_demo -- --settings=settings/dev.toml

use atlassian_dashboard::application_port::*;
use atlassian_dashboard::domain_model::ServiceKind;
use atlassian_dashboard::logger::*;
use atlassian_dashboard::server::*;
use atlassian_dashboard::settings::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let logger = Logger::new_bootstrap();
    let cli = Cli::parse();

    let mut project_settings = parse_settings(cli.settings.as_deref())?;
    project_settings.atlassian.backend = "fake".to_string();
    logger.reload_from_config(&LogConfig {
        filter: project_settings.log.filter.clone(),
    })?;

    let server = Server::try_new(&project_settings)?;

    let login = server
        .auth_service
        .authenticate_api_token(
            ServiceKind::Jira,
            ApiTokenInput {
                domain: "demo.atlassian.net".to_string(),
                email: "demo@example.com".to_string(),
                api_token: "demo-token".to_string(),
            },
        )
        .await?;
    info!(session = %login.session.id, "logged in with an API token");

    let session = server
        .auth_service
        .authorize(&login.token.0, ServiceKind::Jira)
        .await?;
    for project in server.jira_service.list_projects(&session).await? {
        info!(key = %project.key, name = %project.name, "project");
    }

    match server
        .auth_service
        .authorize(&login.token.0, ServiceKind::Confluence)
        .await
    {
        Ok(_) => warn!("a Jira session was accepted for Confluence"),
        Err(e) => info!("confluence with a jira session: {}", e),
    }

    let start = server.auth_service.start_oauth(ServiceKind::Confluence).await;
    match start {
        Ok(start) => info!(url = %start.auth_url, "oauth redirect"),
        Err(e) => info!("oauth start: {}", e),
    }

    server.auth_service.logout(&login.token.0).await?;
    server.shutdown().await;
    Ok(())
}
