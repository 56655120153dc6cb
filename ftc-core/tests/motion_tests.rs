mod common;

use common::{test_profile, Rig, STEP_MS};
use ftc_core::utils::{
    controllers::{
        Direction, MotionController, MotionEvent, MotionOutcome, MotionPhase, MotionTarget,
    },
    hardware::{OpModeHost, RunMode, ZeroPowerBehavior},
    RobotProfile,
};

fn drain(motion: &MotionController) -> Vec<MotionEvent> {
    std::iter::from_fn(|| motion.next_event()).collect()
}

#[test]
fn test_reset_encoders_accumulates_totals() {
    let mut rig = Rig::new(test_profile());
    let readings = [[100, -50, 30, 7], [20, 20, 20, 20], [-5, 0, 3, 1_000]];
    let mut expected = [0i64; 4];

    for ticks in readings {
        rig.set_wheel_positions(ticks);
        rig.robot
            .odometer
            .reset_encoders(&mut rig.robot.drivetrain);
        for (sum, t) in expected.iter_mut().zip(ticks) {
            *sum += i64::from(t);
        }
        assert_eq!(rig.robot.odometer.totals(), expected);
        assert_eq!(rig.robot.drivetrain.positions(), [0; 4]);
    }

    // Every reset zeroes the counters and resumes counting.
    let modes = rig.wheels[0].borrow().modes.clone();
    assert_eq!(modes.len(), 6);
    assert!(modes
        .chunks(2)
        .all(|pair| pair == [RunMode::StopAndResetEncoder, RunMode::RunUsingEncoder]));
}

#[test]
fn test_cumulative_includes_live_counts() {
    let mut rig = Rig::new(test_profile());
    rig.set_wheel_positions([10, 10, 10, 10]);
    rig.robot
        .odometer
        .reset_encoders(&mut rig.robot.drivetrain);
    rig.set_wheel_positions([1, 2, 3, 4]);
    assert_eq!(
        rig.robot.odometer.cumulative(&rig.robot.drivetrain),
        [11, 12, 13, 14]
    );
}

#[test]
fn test_calculate_distance_is_linear_in_ticks() {
    let rig = Rig::new(test_profile());
    rig.set_wheel_positions([100, 100, 100, 100]);
    let one_rev = rig.robot.odometer.calculate_distance(&rig.robot.drivetrain);
    assert!((one_rev - 10.0).abs() < 1e-4);

    rig.set_wheel_positions([250, 250, 250, 250]);
    let since = rig
        .robot
        .odometer
        .distance_since(&rig.robot.drivetrain, one_rev);
    assert!((since - 15.0).abs() < 1e-4);

    // Opposed wheels cancel for straight travel but not for turn progress.
    rig.set_wheel_positions([10, -10, 10, -10]);
    assert_eq!(rig.robot.odometer.drive_average(&rig.robot.drivetrain), 0.0);
    assert_eq!(rig.robot.odometer.average_encoder(&rig.robot.drivetrain), 10.0);
}

#[test]
fn test_zero_distance_finishes_without_polling() {
    let mut rig = Rig::new(test_profile());
    let mut host = rig.host();
    let mut motion = MotionController::from_profile(&rig.robot.profile);

    let outcome = motion.drive(&mut rig.robot, &mut host, 0.0, 0.5);

    assert_eq!(outcome, MotionOutcome::Reached);
    assert_eq!(host.idles, 0);
    for wheel in &rig.wheels {
        // One command to start, one to stop.
        assert_eq!(wheel.borrow().powers, [0.5, 0.0]);
    }
}

#[test]
fn test_drive_reaches_distance_and_stops() {
    let mut rig = Rig::new(test_profile());
    let mut host = rig.host();
    let mut motion = MotionController::from_profile(&rig.robot.profile);

    // 5 units = 50 ticks at 10 ticks per poll.
    let outcome = motion.drive(&mut rig.robot, &mut host, 5.0, 1.0);

    assert_eq!(outcome, MotionOutcome::Reached);
    assert_eq!(host.idles, 5);
    assert_eq!(rig.wheel_powers(), [0.0; 4]);
    assert!(rig.robot.odometer.calculate_distance(&rig.robot.drivetrain) >= 5.0);
    assert_eq!(motion.phase(), MotionPhase::Done(MotionOutcome::Reached));
    assert!(!motion.is_busy());
}

#[test]
fn test_drive_backward_with_matching_signs() {
    let mut rig = Rig::new(test_profile());
    let mut host = rig.host();
    let mut motion = MotionController::from_profile(&rig.robot.profile);

    let outcome = motion.drive(&mut rig.robot, &mut host, -3.0, -1.0);

    assert_eq!(outcome, MotionOutcome::Reached);
    assert_eq!(host.idles, 3);
    assert!(rig.robot.odometer.calculate_distance(&rig.robot.drivetrain) <= -3.0);
}

#[test]
fn test_mismatched_signs_run_until_timeout() {
    let mut rig = Rig::new(test_profile());
    let mut host = rig.host();
    let mut motion = MotionController::from_profile(&rig.robot.profile);

    let outcome = motion.drive(&mut rig.robot, &mut host, -5.0, 1.0);

    assert_eq!(outcome, MotionOutcome::TimedOut);
    assert_eq!(host.now_ms, 1_000);
    assert_eq!(rig.wheel_powers(), [0.0; 4]);
    // The ceiling still caps how far each wheel runs the wrong way.
    for wheel in &rig.wheels {
        assert!(wheel.borrow().position <= 60.0);
    }
}

#[test]
fn test_fast_wheel_is_held_at_ceiling() {
    let mut rig = Rig::new(test_profile());
    rig.wheels[0].borrow_mut().gain = 2.0;
    let mut host = rig.host();
    let mut motion = MotionController::from_profile(&rig.robot.profile);

    let outcome = motion.drive(&mut rig.robot, &mut host, 5.0, 1.0);

    assert_eq!(outcome, MotionOutcome::Reached);
    let fast = rig.wheels[0].borrow();
    assert_eq!(fast.position, 60.0);
    // Zeroed mid-motion, then stopped with the rest.
    assert_eq!(fast.powers, [1.0, 0.0, 0.0]);
    for wheel in &rig.wheels[1..] {
        assert_eq!(wheel.borrow().position, 50.0);
    }
}

#[test]
fn test_positive_turn_drives_left_side_forward() {
    let mut rig = Rig::new(test_profile());
    let mut host = rig.host();
    let mut motion = MotionController::from_profile(&rig.robot.profile);

    // 45 degrees at 2 ticks per degree: 90-tick ceiling, 5 ticks per poll.
    let outcome = motion.turn(&mut rig.robot, &mut host, 45.0, 0.5);

    assert_eq!(outcome, MotionOutcome::Reached);
    assert_eq!(host.idles, 18);
    let first: Vec<f32> = rig.wheels.iter().map(|w| w.borrow().powers[0]).collect();
    assert_eq!(first, [0.5, -0.5, 0.5, -0.5]);
    let snapshot = rig.robot.odometer.snapshot(&rig.robot.drivetrain);
    assert_eq!(snapshot.ticks, [90, -90, 90, -90]);
}

#[test]
fn test_negative_turn_drives_right_side_forward() {
    let mut rig = Rig::new(test_profile());
    let mut host = rig.host();
    let mut motion = MotionController::from_profile(&rig.robot.profile);

    let outcome = motion.turn(&mut rig.robot, &mut host, -30.0, 1.0);

    assert_eq!(outcome, MotionOutcome::Reached);
    let first: Vec<f32> = rig.wheels.iter().map(|w| w.borrow().powers[0]).collect();
    assert_eq!(first, [-1.0, 1.0, -1.0, 1.0]);
    assert!(rig.robot.odometer.average_encoder(&rig.robot.drivetrain) >= 60.0);
}

#[test]
fn test_turn_completes_when_wheels_spin_the_wrong_way() {
    let mut rig = Rig::new(test_profile());
    for wheel in &rig.wheels {
        wheel.borrow_mut().gain = -1.0;
    }
    let mut host = rig.host();
    let mut motion = MotionController::from_profile(&rig.robot.profile);

    let outcome = motion.turn(&mut rig.robot, &mut host, 45.0, 0.5);

    // Turn progress counts magnitudes, so reversed wheels still finish.
    assert_eq!(outcome, MotionOutcome::Reached);
    assert_eq!(host.idles, 18);
    let snapshot = rig.robot.odometer.snapshot(&rig.robot.drivetrain);
    assert_eq!(snapshot.ticks, [-90, 90, -90, 90]);
    assert_eq!(rig.wheel_powers(), [0.0; 4]);
}

#[test]
fn test_cancel_turn_stops_all_wheels() {
    let mut rig = Rig::new(test_profile());
    let mut host = rig.host();
    host.active_for = Some(4);
    let mut motion = MotionController::from_profile(&rig.robot.profile);

    let outcome = motion.turn(&mut rig.robot, &mut host, 90.0, 1.0);

    assert_eq!(outcome, MotionOutcome::Canceled);
    assert_eq!(host.idles, 4);
    assert_eq!(rig.wheel_powers(), [0.0; 4]);
    assert_eq!(
        rig.robot.drivetrain.zero_power_behavior(),
        ZeroPowerBehavior::Float
    );
    assert_eq!(
        drain(&motion).last(),
        Some(&MotionEvent::Finished(MotionOutcome::Canceled))
    );
}

#[test]
fn test_huge_timeout_does_not_overflow() {
    let mut profile = test_profile();
    profile.motion.timeout_ms = Some(u64::MAX);
    let mut rig = Rig::new(profile);
    let mut host = rig.host();
    let mut motion = MotionController::from_profile(&rig.robot.profile);

    assert_eq!(
        motion.drive(&mut rig.robot, &mut host, 5.0, 1.0),
        MotionOutcome::Reached
    );
    assert_eq!(
        motion.drive(&mut rig.robot, &mut host, 0.0, 1.0),
        MotionOutcome::Reached
    );
}

#[test]
fn test_huge_settle_is_clamped_and_cancelable() {
    let mut profile = test_profile();
    profile.motion.settle_ms = u64::MAX;
    let mut rig = Rig::new(profile);
    let mut host = rig.host();
    host.active_for = Some(3);
    let mut motion = MotionController::from_profile(&rig.robot.profile);

    let outcome = motion.drive(&mut rig.robot, &mut host, 0.0, 1.0);

    assert_eq!(outcome, MotionOutcome::Canceled);
    assert_eq!(host.now_ms, 3 * STEP_MS);
    assert_eq!(rig.wheel_powers(), [0.0; 4]);
}

#[test]
fn test_strafe_distance_uses_mecanum_pattern() {
    let mut rig = Rig::new(test_profile());
    let mut host = rig.host();
    let mut motion = MotionController::from_profile(&rig.robot.profile);

    let outcome = motion.strafe_distance(&mut rig.robot, &mut host, Direction::Left, 3.0, -0.8);

    assert_eq!(outcome, MotionOutcome::Reached);
    let first: Vec<f32> = rig.wheels.iter().map(|w| w.borrow().powers[0]).collect();
    assert_eq!(first, [-0.8, 0.8, 0.8, -0.8]);
    assert_eq!(host.idles, 4);
}

#[test]
fn test_cancel_stops_all_wheels_and_skips_settling() {
    let mut profile = test_profile();
    profile.motion.settle_ms = 10_000;
    let mut rig = Rig::new(profile);
    let mut host = rig.host();
    host.active_for = Some(3);
    let mut motion = MotionController::from_profile(&rig.robot.profile);

    let outcome = motion.drive(&mut rig.robot, &mut host, 1_000.0, 1.0);

    assert_eq!(outcome, MotionOutcome::Canceled);
    assert_eq!(host.idles, 3);
    assert_eq!(rig.wheel_powers(), [0.0; 4]);
    let events = drain(&motion);
    assert_eq!(events.len(), 2);
    assert_eq!(events[1], MotionEvent::Finished(MotionOutcome::Canceled));
}

#[test]
fn test_cancel_during_settling() {
    let mut profile = test_profile();
    profile.motion.settle_ms = 10_000;
    let mut rig = Rig::new(profile);
    let mut host = rig.host();
    host.active_for = Some(20);
    let mut motion = MotionController::from_profile(&rig.robot.profile);

    let outcome = motion.drive(&mut rig.robot, &mut host, 5.0, 1.0);

    assert_eq!(outcome, MotionOutcome::Canceled);
    assert_eq!(host.now_ms, 20 * STEP_MS);
    assert_eq!(
        drain(&motion)[1..],
        [
            MotionEvent::Settling(MotionOutcome::Reached),
            MotionEvent::Finished(MotionOutcome::Canceled),
        ]
    );
}

#[test]
fn test_default_settle_pauses_ten_seconds() {
    let mut profile = test_profile();
    profile.motion = RobotProfile::default().motion;
    let mut rig = Rig::new(profile);
    let mut host = rig.host();
    let mut motion = MotionController::from_profile(&rig.robot.profile);

    let outcome = motion.drive(&mut rig.robot, &mut host, 5.0, 1.0);

    assert_eq!(outcome, MotionOutcome::Reached);
    // Reached after 50 ms, then 10 s with the wheels stopped.
    assert_eq!(host.now_ms, 10_050);
    assert_eq!(
        drain(&motion),
        [
            MotionEvent::Started(MotionTarget::Distance {
                distance: 5.0,
                speed: 1.0
            }),
            MotionEvent::Settling(MotionOutcome::Reached),
            MotionEvent::Finished(MotionOutcome::Reached),
        ]
    );
}

#[test]
fn test_brakes_while_moving_then_restores() {
    let mut rig = Rig::new(test_profile());
    let mut host = rig.host();
    let mut motion = MotionController::from_profile(&rig.robot.profile);

    motion.begin(
        &mut rig.robot,
        MotionTarget::Angle {
            degrees: 10.0,
            speed: 1.0,
        },
        host.now(),
    );
    assert_eq!(motion.ceiling(), Some(20.0));
    for wheel in &rig.wheels {
        assert_eq!(wheel.borrow().zero_power, ZeroPowerBehavior::Brake);
    }

    let mut ticks = 0;
    while motion.tick(&mut rig.robot, &mut host) == MotionPhase::Executing {
        host.idle();
        ticks += 1;
    }
    assert_eq!(ticks, 2);
    for wheel in &rig.wheels {
        assert_eq!(wheel.borrow().zero_power, ZeroPowerBehavior::Float);
    }
    assert_eq!(host.value("Ceiling"), Some("20"));
    assert_eq!(host.value("FL"), Some("20"));
}

#[test]
fn test_replacing_a_motion_restores_first_behavior() {
    let mut rig = Rig::new(test_profile());
    let mut host = rig.host();
    let mut motion = MotionController::from_profile(&rig.robot.profile);

    let target = MotionTarget::Distance {
        distance: 100.0,
        speed: 1.0,
    };
    motion.begin(&mut rig.robot, target, host.now());
    motion.begin(&mut rig.robot, target, host.now());
    assert_eq!(
        rig.robot.drivetrain.zero_power_behavior(),
        ZeroPowerBehavior::Brake
    );

    host.active_for = Some(0);
    assert_eq!(
        motion.tick(&mut rig.robot, &mut host),
        MotionPhase::Done(MotionOutcome::Canceled)
    );
    assert_eq!(
        rig.robot.drivetrain.zero_power_behavior(),
        ZeroPowerBehavior::Float
    );
}
