use embassy_executor::Spawner;
use embassy_futures::join::join3;
use embassy_time::{Duration, Timer};
use log::{error, info};
use pourover_flow::calc::format_brew_time;
use pourover_flow::controller::{BrewController, FlowCommand, FlowCommandChannel};
use pourover_flow::export::{build_export, ExportTarget};
use pourover_flow::flow::FlowSession;
use pourover_flow::journal::{
    BrewerInput, BrewerType, CoffeeInput, CoffeeStatus, InMemoryJournal, ProcessType, RoastLevel,
};
use pourover_flow::system::{
    config::ConfigManager,
    events::{EventSubscriber, FlowEvent},
    logger::init_logging,
};

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    if let Err(e) = init_logging() {
        eprintln!("{:?}", e);
    }

    info!("Starting pour-over flow demo");

    let config_manager = match std::env::args().nth(1) {
        Some(path) => match ConfigManager::load_file(&path) {
            Ok(manager) => manager,
            Err(e) => {
                error!("Failed to load config from {}: {:?}", path, e);
                return;
            }
        },
        None => ConfigManager::new(),
    };
    let config = config_manager.get_config().await;

    let journal = InMemoryJournal::new();
    let (coffee_id, brewer_id) = seed_journal(&journal).await;

    let session = match FlowSession::load(&journal, config.recipe.clone()).await {
        Ok(session) => session,
        Err(e) => {
            error!("Failed to load flow data: {:?}", e);
            return;
        }
    };

    let mut controller = match BrewController::new(session, journal.clone(), &config) {
        Ok(controller) => controller,
        Err(e) => {
            error!("Failed to create controller: {}", e);
            return;
        }
    };
    let commands = controller.command_sender();
    let events = controller.events();
    let mut subscriber = match events.subscriber() {
        Ok(subscriber) => subscriber,
        Err(e) => {
            error!("Failed to subscribe to flow events: {:?}", e);
            return;
        }
    };

    let pours = controller.session().state().pour_count;
    join3(
        controller.run(),
        brew_script(&commands, coffee_id, brewer_id, pours),
        report_events(&mut subscriber),
    )
    .await;

    let Some(saved) = controller.last_saved() else {
        error!(
            "Brew was not saved: {:?}",
            controller.session().state().error
        );
        return;
    };
    info!("Saved brew {}", saved.id);

    match build_export(&journal, &ExportTarget::Brew(saved.id.clone()), config.export_history).await {
        Ok(export) => println!("{}", export.prompt_context),
        Err(e) => error!("AI export failed: {:?}", e),
    }
}

async fn seed_journal(journal: &InMemoryJournal) -> (String, String) {
    journal
        .set_user_settings(Some("Comandante C40".to_string()), Some("Fellow Stagg EKG".to_string()))
        .await;

    let coffee = journal
        .add_coffee(CoffeeInput {
            name: "Huila Pink Bourbon".to_string(),
            roaster: "Tostaduría Local".to_string(),
            origin: Some("Colombia".to_string()),
            process: Some(ProcessType::Washed),
            roast_level: Some(RoastLevel::Light),
            roast_date: Some(chrono::Local::now().date_naive().to_string()),
            flavor_notes: vec!["panela".to_string(), "naranja".to_string()],
            status: CoffeeStatus::Active,
        })
        .await;

    let brewer = journal
        .add_brewer(BrewerInput {
            name: "Hario V60".to_string(),
            brewer_type: BrewerType::V60,
            filter_type: Some("Cafec Abaca".to_string()),
            default_dose_g: Some(15.0),
            default_ratio: Some("1:16.7".to_string()),
        })
        .await;

    (coffee.id, brewer.id)
}

// Until the submission outcome; the script always ends with a submit
async fn report_events(subscriber: &mut EventSubscriber<'_>) {
    loop {
        match subscriber.next_event().await {
            FlowEvent::PhaseChanged { from, to } => info!("Phase {} -> {}", from, to),
            FlowEvent::TargetReached { elapsed_seconds } => {
                info!("Bloom done at {}s, start pouring", elapsed_seconds)
            }
            FlowEvent::TimerStopped { elapsed_seconds } => {
                info!("Brew time {}", format_brew_time(Some(elapsed_seconds)))
            }
            FlowEvent::BrewSaved { .. } | FlowEvent::SubmitFailed { .. } => break,
            _ => {}
        }
    }
}

async fn brew_script(
    commands: &FlowCommandChannel,
    coffee_id: String,
    brewer_id: String,
    pours: u32,
) {
    let step = Duration::from_millis(1200);

    commands.send(FlowCommand::Next).await;
    commands.send(FlowCommand::SelectCoffee(coffee_id)).await;
    commands.send(FlowCommand::Next).await;
    commands.send(FlowCommand::SelectBrewer(brewer_id)).await;
    commands.send(FlowCommand::LoadLastSettings).await;
    commands.send(FlowCommand::Next).await;

    commands.send(FlowCommand::BeginBrew).await;
    Timer::after(step).await;
    // Bloom, then each pour
    for _ in 0..=pours {
        commands.send(FlowCommand::Continue).await;
        Timer::after(step).await;
    }
    commands.send(FlowCommand::FinishBrew).await;

    commands.send(FlowCommand::SetRating(Some(4))).await;
    commands
        .send(FlowCommand::SetTastingNotes("panela, cacao, naranja".to_string()))
        .await;
    commands
        .send(FlowCommand::SetFeedback("Dulce, un poco plano al final".to_string()))
        .await;
    commands.send(FlowCommand::Submit).await;
    commands.send(FlowCommand::Shutdown).await;
}
