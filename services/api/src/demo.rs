use crate::infra::{reference_instant, InMemoryAuditLog};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use clap::Args;
use dairy_coop::clock::FixedClock;
use dairy_coop::config::{AppConfig, DashboardConfig};
use dairy_coop::error::AppError;
use dairy_coop::gateway::InMemoryGateway;
use dairy_coop::workflows::deductions::{
    DeductionService, DeductionTypeDraft, FarmerDeductionRequest, ImmediateDeductionRequest,
    RecurringDeductionRequest,
};
use dairy_coop::workflows::farmers::{FarmerId, FarmerRef, KycStatus};
use dairy_coop::workflows::performance::{
    build_dashboard, CollectionImporter, CollectionRecord, FarmerScoringEngine,
    PerformanceDashboard, PerformanceService, QualityGrade,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct PerformanceArgs {
    /// Collection export with farmer_id,liters,quality_grade,total_amount,collection_date
    #[arg(long)]
    pub(crate) collections: PathBuf,
    /// Score as of the end of this date (YYYY-MM-DD). Defaults to now.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Date the demo cooperative is seeded around (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

pub(crate) fn run_performance_report(args: PerformanceArgs) -> Result<(), AppError> {
    let PerformanceArgs { collections, today } = args;
    let config = AppConfig::load()?;

    let records = CollectionImporter::from_path(&collections)?;
    let imported = records.len();
    let grouped = CollectionImporter::group_by_farmer(records);

    let mut farmers: Vec<FarmerRef> = grouped
        .keys()
        .map(|farmer_id| FarmerRef {
            id: farmer_id.clone(),
            full_name: farmer_id.to_string(),
            registration_number: String::new(),
            kyc_status: KycStatus::Approved,
        })
        .collect();
    farmers.sort_by(|left, right| left.id.cmp(&right.id));

    let now = reference_instant(today);
    let engine = FarmerScoringEngine::new();

    println!(
        "Farmer performance from {} ({} collections, {} farmers)",
        collections.display(),
        imported,
        farmers.len()
    );
    for farmer in &farmers {
        let history = grouped
            .get(&farmer.id)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let snapshot = engine.compute_snapshot(farmer.id.clone(), history);
        let risk = engine.compute_risk(&snapshot, now);
        println!(
            "- {}: score {} | {:.1} L | quality {:.2} | {:.1}/week | risk {} ({})",
            farmer.id,
            snapshot.performance_score,
            snapshot.total_liters,
            snapshot.avg_quality_score,
            snapshot.collection_frequency_per_week,
            risk.risk_level.label(),
            risk.risk_score
        );
        for factor in &risk.risk_factors {
            println!("    * {}", factor);
        }
    }

    let dashboard = build_dashboard(&engine, &farmers, &grouped, now, &config.dashboard);
    render_dashboard(&dashboard);
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let today = args.today.unwrap_or_else(|| Utc::now().date_naive());

    println!("Dairy cooperative demo ({today})");
    let gateway = Arc::new(InMemoryGateway::new());
    seed_cooperative(&gateway, today);
    let clock = Arc::new(FixedClock::new(reference_instant(Some(today))));

    let performance = PerformanceService::new(
        gateway.clone(),
        clock.clone(),
        DashboardConfig::default(),
    );
    let dashboard = performance.dashboard()?;
    render_dashboard(&dashboard);

    if let Some(flagged) = dashboard.at_risk_farmers.first() {
        let detail = performance.farmer_performance(&flagged.farmer_id)?;
        println!(
            "\nMost at-risk farmer: {} (score {}, risk {} / {})",
            detail.farmer.full_name,
            detail.snapshot.performance_score,
            detail.risk.risk_level.label(),
            detail.risk.risk_score
        );
    }

    println!("\nDeduction cycle");
    let audit = Arc::new(InMemoryAuditLog::default());
    let deductions = DeductionService::new(gateway, audit.clone(), clock);
    let actor = Some("demo-admin");

    let levy = deductions.create_deduction_type(
        DeductionTypeDraft {
            name: "Transport levy".to_string(),
            description: "Collection route trucking".to_string(),
        },
        actor,
    )?;
    let breeding = deductions.create_deduction_type(
        DeductionTypeDraft {
            name: "AI services".to_string(),
            description: "Artificial insemination visits".to_string(),
        },
        actor,
    )?;

    let batch = deductions.create_recurring_deduction_for_all_farmers(
        RecurringDeductionRequest {
            deduction_type_id: levy.id.clone(),
            amount: 150.0,
            frequency: "monthly".to_string(),
            start_date: Some(today),
        },
        actor,
    )?;
    println!(
        "- {} farmers enrolled in {} ({} failures)",
        batch.created_count,
        levy.name,
        batch.errors.len()
    );

    deductions.save_farmer_deduction(
        FarmerDeductionRequest {
            farmer_id: FarmerId::new("f-002"),
            deduction_type_id: breeding.id.clone(),
            amount: 1_200.0,
            frequency: "weekly".to_string(),
            next_apply_date: Some(today - Duration::days(7)),
        },
        actor,
    )?;

    let charge = deductions.apply_immediate_deduction(
        ImmediateDeductionRequest {
            deduction_type_id: levy.id.clone(),
            amount: 50.0,
            reason: "AGM catering".to_string(),
        },
        "demo-admin",
    )?;
    println!("- System-wide charge {} of {:.2}", charge.id, charge.amount);

    let due = deductions.apply_due_recurring_deductions("demo-scheduler", today)?;
    println!(
        "- Due run applied {} deductions ({} failures)",
        due.applied_count,
        due.errors.len()
    );
    for error in &due.errors {
        println!("    * {}", error);
    }

    println!("Deduction totals:");
    for summary in deductions.farmers_with_deductions()? {
        println!(
            "  - {}: {} standing | total {:.2}",
            summary.full_name,
            summary.deductions.len(),
            summary.total_deductions
        );
    }
    println!("Audit entries recorded: {}", audit.entries().len());

    Ok(())
}

/// Populate the gateway with six farmers whose histories span the risk levels.
pub(crate) fn seed_cooperative(gateway: &InMemoryGateway, today: NaiveDate) {
    let farmers = [
        ("f-001", "Wanjiru Kamau", KycStatus::Approved),
        ("f-002", "Otieno Ochieng", KycStatus::Approved),
        ("f-003", "Achieng Atieno", KycStatus::Approved),
        ("f-004", "Mutua Musyoka", KycStatus::Approved),
        ("f-005", "Chebet Kiprono", KycStatus::Pending),
        ("f-006", "Kiptoo Rotich", KycStatus::Approved),
    ];
    for (id, name, kyc_status) in farmers {
        gateway.add_farmer(FarmerRef {
            id: FarmerId::new(id),
            full_name: name.to_string(),
            registration_number: format!("KDB-{}", id.trim_start_matches("f-")),
            kyc_status,
        });
    }

    let morning = |days_ago: i64| -> DateTime<Utc> {
        (today - Duration::days(days_ago)).and_time(NaiveTime::MIN).and_utc() + Duration::minutes(390)
    };
    let delivery = |farmer: &str, liters: f64, grade: QualityGrade, days_ago: i64| {
        CollectionRecord {
            farmer_id: FarmerId::new(farmer),
            liters,
            total_amount: liters * 48.0,
            quality_grade: grade,
            collection_date: morning(days_ago),
        }
    };

    gateway.add_collections((1..=28).map(|day| delivery("f-001", 35.0, QualityGrade::APlus, day)));
    gateway.add_collections(
        (0..10).map(|step| delivery("f-002", 60.0, QualityGrade::A, 1 + step * 3)),
    );
    gateway.add_collections(
        (0..8).map(|week| delivery("f-003", 120.0, QualityGrade::B, 2 + week * 7)),
    );
    gateway.add_collections([
        delivery("f-004", 40.0, QualityGrade::C, 40),
        delivery("f-004", 25.0, QualityGrade::C, 55),
    ]);
    gateway.add_collections([
        delivery("f-006", 80.0, QualityGrade::B, 20),
        delivery("f-006", 75.0, QualityGrade::A, 21),
    ]);
}

pub(crate) fn render_dashboard(dashboard: &PerformanceDashboard) {
    let stats = &dashboard.stats;
    println!(
        "\nCooperative dashboard (refreshed {})",
        dashboard.last_refreshed.format("%Y-%m-%d %H:%M UTC")
    );
    println!(
        "- {} farmers | {} active | avg score {}",
        stats.total_farmers, stats.active_farmers, stats.avg_performance_score
    );
    println!(
        "- {} at risk ({} critical / {} high / {} medium) | churn {}% | retention {}%",
        stats.at_risk_farmers,
        stats.critical_risk,
        stats.high_risk,
        stats.medium_risk,
        stats.churn_rate,
        stats.retention_rate
    );

    if dashboard.at_risk_farmers.is_empty() {
        println!("At-risk farmers: none");
    } else {
        println!("At-risk farmers:");
        for farmer in &dashboard.at_risk_farmers {
            println!(
                "  - {} [{}] score {} | risk {} | {} | last collection {}",
                farmer.name,
                farmer.farmer_id,
                farmer.score,
                farmer.risk.label(),
                farmer.issue,
                farmer.last_collection
            );
        }
    }

    println!("Top performers:");
    for performer in &dashboard.top_performers {
        println!(
            "  - {:?} {} score {} | {:.1} L over {} collections",
            performer.badge, performer.name, performer.score, performer.volume, performer.collections
        );
    }

    let inactivity = &dashboard.inactivity;
    println!(
        "Inactivity: {} slightly | {} moderately | {} highly | {} dormant | {} lost",
        inactivity.slightly,
        inactivity.moderately,
        inactivity.highly,
        inactivity.dormant,
        inactivity.lost
    );
}
