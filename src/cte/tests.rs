use super::*;

#[test]
fn setup_parses_type_and_length() {
    let aoa = CteConfig::default().with_setup(0x14).unwrap();
    assert_eq!(aoa.mode, CteMode::AoA);
    assert_eq!(aoa.slot, CteSlot::Us2);
    assert_eq!(aoa.length, 20);
    assert_eq!(aoa.info, 0x14);
    assert!(aoa.is_active());

    let aod_1us = CteConfig::default().with_setup(0x40 | 0x02).unwrap();
    assert_eq!(aod_1us.mode, CteMode::AoD);
    assert_eq!(aod_1us.slot, CteSlot::Us1);

    let aod_2us = aod_1us.with_setup(0x80 | 0x0A).unwrap();
    assert_eq!(aod_2us.slot, CteSlot::Us2);
    assert_eq!(aod_2us.length, 10);
}

#[test]
fn setup_checks_length_first() {
    assert_eq!(CteConfig::default().with_setup(0x01), Err(Error::LengthOutOfRange));
    assert_eq!(CteConfig::default().with_setup(0x15), Err(Error::LengthOutOfRange));
    // reserved type with a bad length still reports the length
    assert_eq!(CteConfig::default().with_setup(0xC1), Err(Error::LengthOutOfRange));
    assert_eq!(CteConfig::default().with_setup(0xC2), Err(Error::UnknownType));
}

#[test]
fn aoa_keeps_selected_slot() {
    let cfg = CteConfig::default().with_slot(1).unwrap().with_setup(0x08).unwrap();
    assert_eq!(cfg.slot, CteSlot::Us1);
}

#[test]
fn slot_values() {
    let cfg = CteConfig::default();
    assert_eq!(cfg.with_slot(1).unwrap().slot, CteSlot::Us1);
    assert_eq!(cfg.with_slot(2).unwrap().slot, CteSlot::Us2);
    assert_eq!(cfg.with_slot(0), Err(Error::UnknownSlot));
    assert_eq!(cfg.with_slot(3), Err(Error::UnknownSlot));
}

#[test]
fn antenna_array_bounds() {
    let cfg = CteConfig::default();
    assert_eq!(cfg.with_antennas(0x00, 12), Err(Error::AntennaCountOutOfRange));
    assert_eq!(cfg.with_antennas(13, 12), Err(Error::AntennaCountOutOfRange));

    let linear = cfg.with_antennas(12, 12).unwrap();
    assert_eq!(linear.antenna_count, 12);
    assert_eq!(linear.pattern, AntennaPattern::Linear);

    let mirrored = cfg.with_antennas(0x80 | 4, 12).unwrap();
    assert_eq!(mirrored.antenna_count, 4);
    assert_eq!(mirrored.pattern, AntennaPattern::Mirrored);
}

#[test]
fn expected_samples() {
    let cfg = CteConfig::default().with_setup(0x14).unwrap();
    assert_eq!(cfg.expected_sample_count(), 48);
    let cfg = cfg.with_slot(1).unwrap();
    assert_eq!(cfg.expected_sample_count(), 88);
    let cfg = CteConfig::default().with_setup(0x02).unwrap();
    assert_eq!(cfg.expected_sample_count(), 12);
}

#[test]
fn switch_sequences() {
    let linear = CteConfig::default().with_antennas(3, 12).unwrap();
    assert_eq!(linear.switch_pattern().collect::<Vec<_>>(), [1, 1, 1, 2, 3]);

    let mirrored = CteConfig::default().with_antennas(0x80 | 3, 12).unwrap();
    let seq: Vec<u8> = mirrored.switch_pattern().collect();
    assert_eq!(seq, [1, 1, 1, 2, 3, 2, 1]);
    assert_eq!(mirrored.switch_pattern().len(), 7);

    let single = CteConfig::default().with_antennas(0x80 | 1, 12).unwrap();
    assert_eq!(single.switch_pattern().collect::<Vec<_>>(), [1, 1, 1]);
}

#[test]
fn switching_side() {
    let aoa = CteConfig::default().with_setup(0x14).unwrap();
    assert!(aoa.switches_antennas(true));
    assert!(!aoa.switches_antennas(false));

    let aod = CteConfig::default().with_setup(0x54).unwrap();
    assert!(aod.setup(false).switching);
    assert!(!aod.setup(true).switching);
    assert!(aod.setup(true).receive);
}
