use asset_relations::core::naming::summarize;
use asset_relations::core::presentation::PresentationAssembler;
use asset_relations::domain::model::Document;
use asset_relations::domain::ports::DocumentRepository;
use asset_relations::utils::error::ErrorSeverity;
use asset_relations::utils::monitor::SystemMonitor;
use asset_relations::utils::validation::{validate_required_field, Validate};
use asset_relations::utils::logger;
use asset_relations::{
    build_asset_relations, zip_directory, AssetDataChecker, BatchUpdater, CliConfig, Command,
    CursorStore, InMemoryRepository, LocalStorage, PresentationRequest, RelationContext,
    RelationsConfig, RelationsError, Result, TemplateCommandExecutor,
};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }
    tracing::debug!("CLI config: {:?}", cli);

    let monitor = SystemMonitor::new(cli.monitor);
    if monitor.is_enabled() {
        tracing::info!("🔍 System monitoring enabled");
    }
    monitor.log_stats("Start");

    match run(&cli).await {
        Ok(()) => monitor.log_stats("Done"),
        Err(e) => {
            tracing::error!(
                "❌ {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }
}

async fn run(cli: &CliConfig) -> Result<()> {
    let config = match &cli.config {
        Some(path) => {
            tracing::info!("📁 Loading configuration from: {}", path.display());
            RelationsConfig::from_file(path)?
        }
        None => RelationsConfig::default(),
    };
    config.validate()?;

    match &cli.command {
        Command::Parse { titles } => {
            for title in titles {
                println!("{}", serde_json::to_string(&summarize(title))?);
            }
            Ok(())
        }
        Command::Zip {
            source,
            destination,
        } => {
            let count = zip_directory(source, destination)?;
            println!("✅ {} files written to {}", count, destination.display());
            Ok(())
        }
        Command::Classify { ids } => {
            let repository = open_repository(cli, &config)?;
            let ctx = relation_context(&repository, &config);

            for doc in fetch_documents(repository.as_ref(), ids).await? {
                build_asset_relations(doc, &ctx).await?;
            }
            repository.commit().await?;
            println!("✅ {} documents processed", ids.len());
            Ok(())
        }
        Command::UpdateAll {
            strict,
            resume,
            reset_cursor,
        } => {
            let repository = open_repository(cli, &config)?;
            let ctx = relation_context(&repository, &config);

            let mut settings = config.batch.clone();
            settings.strict |= *strict;
            settings.resume |= *resume;

            let updater = BatchUpdater::new(&ctx, &settings);
            let report = if settings.resume || *reset_cursor || settings.cursor_file.is_some() {
                let cursor_file = validate_required_field("batch.cursor_file", &settings.cursor_file)?;
                let store = CursorStore::new(LocalStorage::new("."), cursor_file.as_str());
                if *reset_cursor {
                    store.clear().await?;
                }
                updater.with_cursor(store).update_all().await?
            } else {
                updater.update_all().await?
            };

            println!(
                "✅ {} processed, {} saved, {} commits, {} failed",
                report.processed,
                report.saved,
                report.commits,
                report.failed.len()
            );
            for failed in &report.failed {
                eprintln!("   {}: {}", failed.id, failed.error);
            }
            if report.stopped {
                return Err(RelationsError::ValidationError {
                    message: "Update stopped at the first failing document".to_string(),
                });
            }
            Ok(())
        }
        Command::Present {
            ids,
            title,
            file_name,
            style,
            output,
            zip_output,
        } => {
            let repository = open_repository(cli, &config)?;
            let executor = TemplateCommandExecutor::new(config.command_templates());
            let assembler =
                PresentationAssembler::new(repository.as_ref(), &executor, &config.presentation);

            let docs = fetch_documents(repository.as_ref(), ids).await?;
            let request = PresentationRequest {
                title: title.clone(),
                file_name: file_name.clone(),
                style: style.clone(),
                include_site_zip: zip_output.is_some(),
            };
            let result = assembler.assemble(&docs, &request).await?;

            std::fs::create_dir_all(output)?;
            let pdf_path = output.join(&result.pdf.filename);
            std::fs::write(&pdf_path, &result.pdf.data)?;
            println!("📄 {} ({} images)", pdf_path.display(), result.image_count);

            if let (Some(zip_path), Some(site_zip)) = (zip_output, &result.site_zip) {
                std::fs::write(zip_path, &site_zip.data)?;
                println!("📦 {}", zip_path.display());
            }
            Ok(())
        }
        Command::CheckAssetData { ids } => {
            let repository = open_repository(cli, &config)?;
            let checker = AssetDataChecker::new(repository.as_ref());

            let mut created = Vec::new();
            for doc in fetch_documents(repository.as_ref(), ids).await? {
                created.extend(checker.check(&doc).await?);
            }
            repository.commit().await?;

            println!("✅ {} vocabulary entries created", created.len());
            for entry in created {
                println!("   {}", entry);
            }
            Ok(())
        }
    }
}

fn open_repository(cli: &CliConfig, config: &RelationsConfig) -> Result<Arc<InMemoryRepository>> {
    let path = match &cli.repository {
        Some(path) => path.clone(),
        None => PathBuf::from(validate_required_field(
            "repository.snapshot",
            &config.repository.snapshot,
        )?),
    };
    tracing::info!("📂 Opening repository snapshot: {}", path.display());
    Ok(Arc::new(InMemoryRepository::load(path)?))
}

fn relation_context(repository: &Arc<InMemoryRepository>, config: &RelationsConfig) -> RelationContext {
    RelationContext::new(
        repository.clone(),
        repository.clone(),
        &config.classifier.picture_type,
        config.classifier.containers.clone(),
    )
}

async fn fetch_documents(repository: &dyn DocumentRepository, ids: &[String]) -> Result<Vec<Document>> {
    let mut docs = Vec::with_capacity(ids.len());
    for id in ids {
        let doc = repository
            .get_document(id)
            .await?
            .ok_or_else(|| RelationsError::DocumentNotFound { id: id.clone() })?;
        docs.push(doc);
    }
    Ok(docs)
}
