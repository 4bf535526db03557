//! Property tests for the rewrite pass.
//!
//! Programs are random walks of rapids, plunges, lifts and draw moves with
//! occasional layer markers, so long strokes, color changes and
//! mid-stroke markers all show up.

mod support;

use brushograph_gcode::{parse_line, Formatter, Instruction};
use brushograph_optimizer::{
    Decision, InsertionPolicy, MachineState, PickupReason, PolicyConfig, RewriteOptions,
    Rewriter,
};
use proptest::prelude::*;
use support::resolver;

#[derive(Debug, Clone)]
enum Step {
    Marker(&'static str),
    Travel(i32, i32),
    Plunge,
    Lift,
    Draw(i32, i32),
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        1 => prop::sample::select(vec!["Green", "Blue", "Red", "C00", "C03"]).prop_map(Step::Marker),
        2 => (0i32..200, 0i32..200).prop_map(|(x, y)| Step::Travel(x, y)),
        2 => Just(Step::Plunge),
        2 => Just(Step::Lift),
        12 => (-30i32..30, -30i32..30).prop_map(|(dx, dy)| Step::Draw(dx, dy)),
    ]
}

fn program() -> impl Strategy<Value = String> {
    prop::collection::vec(step(), 1..120).prop_map(|steps| {
        let (mut x, mut y) = (0i32, 0i32);
        let mut lines = vec!["G0 X0 Y0 Z5".to_string()];
        for step in steps {
            lines.push(match step {
                Step::Marker(color) => format!(";Layer {}", color),
                Step::Travel(nx, ny) => {
                    x = nx;
                    y = ny;
                    format!("G0 X{} Y{}", x, y)
                }
                Step::Plunge => "G1 Z0 F1000".to_string(),
                Step::Lift => "G0 Z5".to_string(),
                Step::Draw(dx, dy) => {
                    x += dx;
                    y += dy;
                    format!("G1 X{} Y{}", x, y)
                }
            });
        }
        lines.join("\n")
    })
}

fn policy() -> impl Strategy<Value = PolicyConfig> {
    (20.0f64..150.0, 1.0f64..3.0, prop::bool::ANY).prop_map(|(d, m, aggressive)| PolicyConfig {
        distance_threshold: d,
        force_multiplier: m,
        aggressive,
    })
}

fn instructions(text: &str) -> Vec<Instruction> {
    text.lines()
        .enumerate()
        .map(|(i, line)| parse_line(line, i + 1).unwrap())
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn distance_is_zero_right_after_every_pickup(text in program(), config in policy()) {
        let resolver = resolver();
        let options = RewriteOptions { policy: config, ..Default::default() };
        let output = Rewriter::new(options, &resolver).rewrite(&text).unwrap();
        for entry in output.log.entries().iter().filter(|e| e.decision.is_pickup()) {
            prop_assert_eq!(entry.accumulated_distance, 0.0);
        }
    }

    #[test]
    fn pickups_respect_thresholds(text in program(), config in policy()) {
        let resolver = resolver();
        let options = RewriteOptions { policy: config, ..Default::default() };
        let output = Rewriter::new(options, &resolver).rewrite(&text).unwrap();

        for entry in output.log.entries() {
            match entry.decision.pickup_reason() {
                Some(PickupReason::Threshold) | Some(PickupReason::Aggressive) => {
                    prop_assert!(entry.distance_at_decision > config.distance_threshold);
                }
                Some(PickupReason::Forced) => {
                    prop_assert!(!config.aggressive);
                    prop_assert!(entry.distance_at_decision >= config.force_threshold());
                }
                Some(PickupReason::LayerStart) | None => {}
            }
        }
    }

    #[test]
    fn mid_stroke_pickups_need_the_hard_limit(text in program(), config in policy()) {
        prop_assume!(!config.aggressive);
        let resolver = resolver();
        let options = RewriteOptions { policy: config, ..Default::default() };
        let output = Rewriter::new(options, &resolver).rewrite(&text).unwrap();

        // Replay the program to find out which boundaries were mid-stroke.
        let mut state = MachineState::new();
        for (instruction, entry) in instructions(&text).iter().zip(output.log.entries()) {
            let mid_stroke = !InsertionPolicy::is_clean_transition(&state, instruction)
                && instruction.is_draw();
            if mid_stroke && entry.decision.is_pickup()
                && entry.decision.pickup_reason() != Some(PickupReason::LayerStart)
            {
                prop_assert!(entry.distance_at_decision >= config.force_threshold());
            }
            if entry.decision.is_pickup() {
                state.reset_distance();
            }
            state.apply(instruction);
        }
    }

    #[test]
    fn interrupted_strokes_resume_where_they_stopped(text in program(), config in policy()) {
        let resolver = resolver();
        let options = RewriteOptions { policy: config, ..Default::default() };
        let output = Rewriter::new(options, &resolver).rewrite(&text).unwrap();

        let mut state = MachineState::new();
        for (instruction, entry) in instructions(&text).iter().zip(output.log.entries()) {
            if state.is_drawing() && instruction.is_draw() && entry.decision.is_pickup() {
                let (x, y) = state.position().planar().unwrap();
                match &entry.decision {
                    Decision::InsertPickupAndResume { resume_at, .. } => {
                        prop_assert_eq!(resume_at.planar(), Some((x, y)));
                    }
                    other => prop_assert!(false, "stroke interrupted without resume: {:?}", other),
                }
            }
            if entry.decision.is_pickup() {
                state.reset_distance();
            }
            state.apply(instruction);
        }
    }

    #[test]
    fn brush_is_lowered_only_over_the_drawing(text in program(), config in policy()) {
        let resolver = resolver();
        let options = RewriteOptions { policy: config, ..Default::default() };
        let output = Rewriter::new(options, &resolver).rewrite(&text).unwrap();

        for entry in output.log.entries() {
            if let Decision::InsertPickupAndResume { resume_at, .. } = &entry.decision {
                if resume_at.z.is_some() {
                    prop_assert!(resume_at.has_xy(), "line {}: {:?}", entry.line_number, resume_at);
                }
            }
        }
    }

    #[test]
    fn every_layer_gets_one_pickup_before_drawing(text in program()) {
        let resolver = resolver();
        let output = Rewriter::new(RewriteOptions::default(), &resolver).rewrite(&text).unwrap();

        // `None` outside a layer or once its first draw has been checked
        let mut pickups_in_layer: Option<usize> = None;
        for (instruction, entry) in instructions(&text).iter().zip(output.log.entries()) {
            if instruction.layer_color().is_some() {
                pickups_in_layer = Some(0);
            }
            if entry.decision.is_pickup() {
                pickups_in_layer = pickups_in_layer.map(|n| n + 1);
            }
            let draws = instruction.is_draw() && instruction.target().is_some_and(|t| !t.is_empty());
            if draws {
                if let Some(count) = pickups_in_layer.take() {
                    prop_assert_eq!(count, 1);
                }
            }
        }
    }

    #[test]
    fn rewritten_output_is_already_formatted(text in program()) {
        let resolver = resolver();
        let output = Rewriter::new(RewriteOptions::default(), &resolver).rewrite(&text).unwrap();
        let gcode = output.gcode.unwrap();
        prop_assert_eq!(Formatter::default().format_str(&gcode).unwrap(), gcode);
    }
}
