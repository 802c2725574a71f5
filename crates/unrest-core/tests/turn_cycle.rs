//! Integration tests for the full turn cycle.
//!
//! These drive the ledger, contagion, event calculators and strike manager
//! together through [`TurnRunner`] and check the cross-component contracts:
//! refugee penalties feeding the strike gate, seeded replays, bounded
//! morale and a ledger that always mirrors the strike manager.

#![allow(clippy::unwrap_used)]

use rand::SeedableRng;
use rand::rngs::SmallRng;
use rust_decimal_macros::dec;
use unrest_core::{MoraleEvent, TurnInputs, TurnRunner, UnrestConfig, build_rng};
use unrest_ledger::{InvariantResult, MoraleLedger};
use unrest_strikes::{ResolutionCause, StrikeConfig, should_spawn_strike};
use unrest_types::{
    DefeatTier, MORALE_HISTORY_LEN, ProtestOutcome, ProtestState, TerritoryId, VictoryTier,
};

const FRONTIER: &str = "
simulation:
  seed: 42
morale:
  natural_recovery_rate: 0.05
territories:
  - id: capital
    adjacent: [mill, port]
    is_capital: true
    strategic_value: 3
    production: 800
  - id: mill
    adjacent: [capital, marsh]
    is_industrial: true
    production: 700
  - id: port
    adjacent: [capital]
    has_transportation: true
    is_border: true
    production: 500
  - id: marsh
    adjacent: [mill]
    origin: conquered
    is_border: true
    production: 900
";

fn id(name: &str) -> TerritoryId {
    TerritoryId::from(name)
}

/// A varied but fixed script of inputs for turn `turn`.
fn scripted_inputs(turn: u64) -> TurnInputs {
    let mut inputs = TurnInputs::default();
    match turn % 5 {
        0 => inputs.events.push(MoraleEvent::Defeat {
            tier: DefeatTier::Major,
            battle: id("marsh"),
        }),
        1 => inputs.protests_started.push((
            id("mill"),
            ProtestState {
                intensity: 5.0,
                morale_impact: 4.0,
                start_turn: turn,
            },
        )),
        2 => inputs.events.push(MoraleEvent::RefugeeInflux {
            territory: id("port"),
            refugees: 600,
        }),
        3 => inputs
            .protests_resolved
            .push((id("mill"), ProtestOutcome::Suppressed)),
        _ => inputs.events.push(MoraleEvent::BorderInstability {
            neighboring_nation_morale: vec![20.0, 35.0],
        }),
    }
    if turn % 7 == 0 {
        inputs.events.push(MoraleEvent::Victory {
            tier: VictoryTier::Minor,
            battle: id("port"),
        });
    }
    inputs
}

#[test]
fn refugee_influx_keeps_territory_above_strike_threshold() {
    // Ledger on its own.
    let mut ledger = MoraleLedger::new();
    let t1 = id("T1");
    ledger.initialize_territory(t1.clone(), 60.0, 0);
    let record = ledger.apply_refugee_influx(&t1, 1500).unwrap();
    assert!((record.last_morale_change + 10.0).abs() < f64::EPSILON);
    assert_eq!(ledger.morale(&t1), Some(50.0));

    let config = StrikeConfig::default();
    for seed in 0..200 {
        let mut rng = SmallRng::seed_from_u64(seed);
        assert!(!should_spawn_strike(&config, 50.0, 400.0, false, &mut rng));
    }

    // Same scenario through the runner.
    let config = UnrestConfig::parse(
        "
territories:
  - id: T1
    production: 400
",
    )
    .unwrap();
    let mut runner = TurnRunner::with_rng(&config, build_rng(Some(42))).unwrap();
    let inputs = TurnInputs {
        events: vec![MoraleEvent::RefugeeInflux {
            territory: t1.clone(),
            refugees: 1500,
        }],
        ..TurnInputs::default()
    };
    let summary = runner.run_turn(&inputs).unwrap();
    assert_eq!(runner.ledger().morale(&t1), Some(50.0));
    assert!(summary.strikes_started.is_empty());
    assert_eq!(summary.active_strikes, 0);
}

#[test]
fn seeded_runs_replay_exactly() {
    let config = UnrestConfig::parse(FRONTIER).unwrap();
    let mut first = TurnRunner::from_config(&config).unwrap();
    let mut second = TurnRunner::from_config(&config).unwrap();

    for turn in 1..=30 {
        let inputs = scripted_inputs(turn);
        let a = first.run_turn(&inputs).unwrap();
        let b = second.run_turn(&inputs).unwrap();
        assert_eq!(a, b, "turn {turn} diverged");
    }
    assert_eq!(first.export_state(), second.export_state());
    assert_eq!(first.save_json().unwrap(), second.save_json().unwrap());
}

#[test]
fn long_run_preserves_invariants() {
    let config = UnrestConfig::parse(FRONTIER).unwrap();
    let mut runner = TurnRunner::with_rng(&config, build_rng(Some(7))).unwrap();
    let auto_resolve = config.strikes.auto_resolve_turns;

    for turn in 1..=60 {
        let summary = runner.run_turn(&scripted_inputs(turn)).unwrap();
        assert_eq!(summary.turn, turn);
        assert!((0.0..=100.0).contains(&summary.national.average));
        assert!(summary.production_lost >= 0.0);

        assert!(matches!(runner.ledger().verify_invariants(), InvariantResult::Healthy));
        for record in runner.ledger().records() {
            assert!((0.0..=100.0).contains(&record.morale));
            assert!(record.historical_morale.len() <= MORALE_HISTORY_LEN);
            assert_eq!(
                record.has_strike(),
                runner.strikes().has_strike(&record.territory_id)
            );
        }
        for strike in runner.strikes().strikes().values() {
            assert!(strike.duration <= auto_resolve);
        }
        for ended in &summary.strikes_ended {
            if ended.cause == ResolutionCause::Exhausted {
                assert!(ended.duration > auto_resolve);
            }
        }
    }
}

#[test]
fn player_settles_every_strike() {
    let config = UnrestConfig::parse(FRONTIER).unwrap();
    let mut runner = TurnRunner::from_config(&config).unwrap();

    let mut settled = 0;
    for turn in 1..=40 {
        // A brutal occupation pins the marsh near 5 morale every turn.
        let mut inputs = scripted_inputs(turn);
        inputs.events.push(MoraleEvent::Conquest {
            territory: id("marsh"),
            turns_occupied: 0,
            occupier_harshness: 100.0,
        });
        runner.run_turn(&inputs).unwrap();
        for territory in runner.strikes().active_territories() {
            let before = runner.ledger().morale(&territory).unwrap();
            let paid = runner.pay_demands(&territory).unwrap();
            assert!(paid.cost >= dec!(0));
            assert!(runner.ledger().morale(&territory).unwrap() >= before);
            assert!(!runner.ledger().get(&territory).unwrap().has_strike());
            settled += 1;
        }
        assert!(runner.strikes().is_empty());
    }
    assert!(settled > 0);
}

#[test]
fn save_and_restore_mid_campaign() {
    let config = UnrestConfig::parse(FRONTIER).unwrap();
    let mut runner = TurnRunner::from_config(&config).unwrap();
    for turn in 1..=12 {
        runner.run_turn(&scripted_inputs(turn)).unwrap();
    }
    let json = runner.save_json().unwrap();

    let mut restored = TurnRunner::with_rng(&config, build_rng(Some(99))).unwrap();
    restored.load_json(&json).unwrap();
    assert_eq!(restored.turn(), 12);
    assert_eq!(restored.export_state(), runner.export_state());

    // The restored simulation keeps running from turn 13.
    let summary = restored.run_turn(&scripted_inputs(13)).unwrap();
    assert_eq!(summary.turn, 13);
}
