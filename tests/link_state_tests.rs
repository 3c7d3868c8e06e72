use groundlink::*;

fn plan() -> LinkPlan {
    LinkPlan::from(&RadioConfig::default())
}

#[test]
fn test_link_starts_wide_on_default_carrier() {
    let link = LinkState::new(plan());

    assert_eq!(link.mode(), BandwidthMode::Wide);
    assert!(!link.is_tracking());
    assert_eq!(link.carrier_frequency_mhz(), 436.7);
    assert_eq!(link.bandwidth_khz(), 125.0);
}

#[test]
fn test_timeout_in_wide_mode_is_idempotent() {
    let mut link = LinkState::new(plan());
    let mut radio = SimulatedTransceiver::default();

    for _ in 0..5 {
        let transition = link.on_receive_failure(&ReceiveOutcome::Timeout, &mut radio);
        assert_eq!(transition, LinkTransition::None);
        assert_eq!(link.mode(), BandwidthMode::Wide);
        assert_eq!(link.carrier_frequency_mhz(), plan().default_carrier_mhz);
    }

    // Searching never reprograms the radio
    assert!(radio.frequency_commands().is_empty());
    assert!(radio.bandwidth_commands().is_empty());
}

#[test]
fn test_timeout_in_narrow_mode_falls_back_to_wide() {
    let mut link = LinkState::tracking(plan(), 437.5);
    let mut radio = SimulatedTransceiver::default();
    assert_eq!(link.mode(), BandwidthMode::Narrow);

    let transition = link.on_receive_failure(&ReceiveOutcome::Timeout, &mut radio);

    assert_eq!(transition, LinkTransition::Lost);
    assert_eq!(link.mode(), BandwidthMode::Wide);
    assert_eq!(link.carrier_frequency_mhz(), 436.7);
    assert_eq!(link.bandwidth_khz(), 125.0);
    assert_eq!(radio.frequency_commands(), &[436.7]);
    assert_eq!(radio.bandwidth_commands(), &[125.0]);

    // A second timeout is back to plain searching
    let transition = link.on_receive_failure(&ReceiveOutcome::Timeout, &mut radio);
    assert_eq!(transition, LinkTransition::None);
    assert_eq!(radio.frequency_commands().len(), 1);
    assert_eq!(radio.bandwidth_commands().len(), 1);
}

#[test]
fn test_crc_mismatch_never_changes_mode() {
    let mut radio = SimulatedTransceiver::default();

    let mut wide = LinkState::new(plan());
    assert_eq!(wide.on_receive_failure(&ReceiveOutcome::CrcMismatch, &mut radio), LinkTransition::None);
    assert_eq!(wide.mode(), BandwidthMode::Wide);

    let mut narrow = LinkState::tracking(plan(), 437.5);
    for _ in 0..3 {
        assert_eq!(narrow.on_receive_failure(&ReceiveOutcome::CrcMismatch, &mut radio), LinkTransition::None);
    }
    assert_eq!(narrow.mode(), BandwidthMode::Narrow);
    assert_eq!(narrow.carrier_frequency_mhz(), 437.5);

    assert!(radio.frequency_commands().is_empty());
    assert!(radio.bandwidth_commands().is_empty());
}

#[test]
fn test_unknown_outcome_treated_as_crc_mismatch() {
    let mut radio = SimulatedTransceiver::default();
    let mut narrow = LinkState::tracking(plan(), 437.5);

    let transition = narrow.on_receive_failure(&ReceiveOutcome::Unknown(-5), &mut radio);

    assert_eq!(transition, LinkTransition::None);
    assert_eq!(narrow.mode(), BandwidthMode::Narrow);
    assert!(radio.frequency_commands().is_empty());
}

#[test]
fn test_acquire_moves_to_narrow_and_retunes() {
    let mut link = LinkState::new(plan());
    let mut radio = SimulatedTransceiver::default();

    let transition = link.acquire(-3000.0, &mut radio);

    let LinkTransition::Acquired { carrier_frequency_mhz } = transition else {
        panic!("expected acquisition, got {:?}", transition);
    };
    assert!((carrier_frequency_mhz - 436.697).abs() < 1e-4);
    assert_eq!(link.mode(), BandwidthMode::Narrow);
    assert_eq!(link.bandwidth_khz(), 20.8);
    assert_eq!(radio.frequency_commands(), &[carrier_frequency_mhz]);
    assert_eq!(radio.bandwidth_commands(), &[20.8]);
}

#[test]
fn test_acquire_while_tracking_refines_carrier_only() {
    let mut link = LinkState::new(plan());
    let mut radio = SimulatedTransceiver::default();

    link.acquire(2000.0, &mut radio);
    let transition = link.acquire(500.0, &mut radio);

    assert!(matches!(transition, LinkTransition::Retuned { .. }));
    assert!((link.carrier_frequency_mhz() - 436.7025).abs() < 1e-4);
    assert_eq!(radio.frequency_commands().len(), 2);
    // Bandwidth is narrowed once, on the first acquisition
    assert_eq!(radio.bandwidth_commands(), &[20.8]);
}

#[test]
fn test_acquire_then_lose_restores_exact_default_carrier() {
    let mut link = LinkState::new(plan());
    let mut radio = SimulatedTransceiver::default();

    link.acquire(12_345.0, &mut radio);
    link.on_receive_failure(&ReceiveOutcome::Timeout, &mut radio);

    assert_eq!(link, LinkState::new(plan()));
    assert_eq!(radio.frequency_mhz(), 436.7);
    assert_eq!(radio.bandwidth_khz(), 125.0);
}

#[test]
fn test_failed_reset_is_retried_on_search_timeouts() {
    let mut radio = SimulatedTransceiver::default();
    radio.begin(&RadioConfig::default()).unwrap();
    radio.set_frequency(437.5).unwrap();
    let mut radio = radio.failing_set_frequency(-3);
    let mut link = LinkState::tracking(plan(), 437.5);

    // Reset is rejected, state still falls back
    let transition = link.on_receive_failure(&ReceiveOutcome::Timeout, &mut radio);
    assert_eq!(transition, LinkTransition::Lost);
    assert_eq!(link.mode(), BandwidthMode::Wide);
    assert_eq!(link.carrier_frequency_mhz(), 436.7);
    assert!(!link.is_radio_in_sync());
    assert_eq!(radio.frequency_mhz(), 437.5);
    assert_eq!(radio.frequency_commands().len(), 2);

    // Still failing: every search timeout tries again
    assert_eq!(link.on_receive_failure(&ReceiveOutcome::Timeout, &mut radio), LinkTransition::None);
    assert_eq!(radio.frequency_commands().len(), 3);
    assert!(!link.is_radio_in_sync());

    radio.clear_command_errors();
    assert_eq!(link.on_receive_failure(&ReceiveOutcome::Timeout, &mut radio), LinkTransition::None);
    assert!(link.is_radio_in_sync());
    assert_eq!(radio.frequency_mhz(), 436.7);
    assert_eq!(radio.bandwidth_khz(), 125.0);
    assert_eq!(link, LinkState::new(plan()));

    // Back in sync, searching stops reprogramming
    link.on_receive_failure(&ReceiveOutcome::Timeout, &mut radio);
    assert_eq!(radio.frequency_commands().len(), 4);
    assert_eq!(radio.bandwidth_commands().len(), 3);
}

#[test]
fn test_failed_narrow_bandwidth_repeated_on_refinement() {
    let mut radio = SimulatedTransceiver::default().failing_set_bandwidth(-4);
    radio.begin(&RadioConfig::default()).unwrap();
    let mut link = LinkState::new(plan());

    let transition = link.acquire(1000.0, &mut radio);
    assert!(matches!(transition, LinkTransition::Acquired { .. }));
    assert_eq!(link.mode(), BandwidthMode::Narrow);
    assert!(!link.is_radio_in_sync());
    assert_eq!(radio.bandwidth_khz(), 125.0);

    radio.clear_command_errors();
    let transition = link.acquire(500.0, &mut radio);
    assert!(matches!(transition, LinkTransition::Retuned { .. }));
    assert!(link.is_radio_in_sync());
    assert_eq!(radio.bandwidth_commands(), &[20.8, 20.8]);
    assert_eq!(radio.bandwidth_khz(), 20.8);
}

#[test]
fn test_acquire_discards_non_finite_frequency_error() {
    for error in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
        let mut link = LinkState::new(plan());
        let mut radio = SimulatedTransceiver::default();

        let transition = link.acquire(error, &mut radio);

        assert_eq!(transition, LinkTransition::None, "error {}", error);
        assert_eq!(link, LinkState::new(plan()));
        assert!(radio.frequency_commands().is_empty());
        assert!(radio.bandwidth_commands().is_empty());
    }
}

#[test]
fn test_acquire_discards_carrier_outside_tunable_range() {
    let mut radio = SimulatedTransceiver::default();

    let mut link = LinkState::new(plan());
    assert_eq!(link.acquire(1.0e9, &mut radio), LinkTransition::None);
    assert_eq!(link.mode(), BandwidthMode::Wide);

    let mut tracking = LinkState::tracking(plan(), 437.5);
    assert_eq!(tracking.acquire(-400.0e6, &mut radio), LinkTransition::None);
    assert_eq!(tracking.carrier_frequency_mhz(), 437.5);

    assert!(radio.frequency_commands().is_empty());
}
