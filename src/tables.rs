//! Fixed lookup tables from the SCTE-35 standard.

/// Labels for the 2-bit `device_restrictions` field (Table 20).
pub const DEVICE_RESTRICTIONS: [&str; 4] = [
    "Restrict Group 0",
    "Restrict Group 1",
    "Restrict Group 2",
    "None",
];

/// `segmentation_type_id` values and their messages (Table 22).
pub const SEGMENTATION_MESSAGES: &[(u8, &str)] = &[
    (0x00, "Not Indicated"),
    (0x01, "Content Identification"),
    (0x02, "Call Ad Server"),
    (0x10, "Program Start"),
    (0x11, "Program End"),
    (0x12, "Program Early Termination"),
    (0x13, "Program Breakaway"),
    (0x14, "Program Resumption"),
    (0x15, "Program Runover Planned"),
    (0x16, "Program Runover Unplanned"),
    (0x17, "Program Overlap Start"),
    (0x18, "Program Blackout Override"),
    (0x19, "Program Start - In Progress"),
    (0x20, "Chapter Start"),
    (0x21, "Chapter End"),
    (0x22, "Break Start"),
    (0x23, "Break End"),
    (0x24, "Opening Credit Start"),
    (0x25, "Opening Credit End"),
    (0x26, "Closing Credit Start"),
    (0x27, "Closing Credit End"),
    (0x30, "Provider Advertisement Start"),
    (0x31, "Provider Advertisement End"),
    (0x32, "Distributor Advertisement Start"),
    (0x33, "Distributor Advertisement End"),
    (0x34, "Provider Placement Opportunity Start"),
    (0x35, "Provider Placement Opportunity End"),
    (0x36, "Distributor Placement Opportunity Start"),
    (0x37, "Distributor Placement Opportunity End"),
    (0x38, "Provider Overlay Placement Opportunity Start"),
    (0x39, "Provider Overlay Placement Opportunity End"),
    (0x3A, "Distributor Overlay Placement Opportunity Start"),
    (0x3B, "Distributor Overlay Placement Opportunity End"),
    (0x3C, "Provider Promo Start"),
    (0x3D, "Provider Promo End"),
    (0x3E, "Distributor Promo Start"),
    (0x3F, "Distributor Promo End"),
    (0x40, "Unscheduled Event Start"),
    (0x41, "Unscheduled Event End"),
    (0x42, "Alternate Content Opportunity Start"),
    (0x43, "Alternate Content Opportunity End"),
    (0x44, "Provider Ad Block Start"),
    (0x45, "Provider Ad Block End"),
    (0x46, "Distributor Ad Block Start"),
    (0x47, "Distributor Ad Block End"),
    (0x50, "Network Start"),
    (0x51, "Network End"),
];

/// Segmentation types that carry `sub_segment_num` and `sub_segments_expected`.
pub const SUB_SEGMENT_TYPES: [u8; 4] = [0x34, 0x36, 0x38, 0x3A];

/// Names of the `segmentation_upid_type` values this crate decodes.
pub const UPID_NAMES: &[(u8, &str)] = &[
    (0x01, "Deprecated"),
    (0x02, "Deprecated"),
    (0x03, "AdID"),
    (0x05, "ISAN"),
    (0x06, "ISAN"),
    (0x07, "TID"),
    (0x08, "AiringID"),
    (0x09, "ADI"),
    (0x0A, "EIDR"),
    (0x0B, "ATSC"),
    (0x0C, "MPU"),
    (0x0D, "MID"),
    (0x0E, "ADS Info"),
    (0x0F, "URI"),
    (0x10, "UUID"),
    (0x11, "ACR"),
];

/// Label used for UPID types missing from [`UPID_NAMES`].
pub const UNKNOWN_UPID_NAME: &str = "UPID";

/// `splice_command_type` values and their names (Table 7).
pub const SPLICE_COMMANDS: &[(u8, &str)] = &[
    (0x00, "Splice Null"),
    (0x04, "Splice Schedule"),
    (0x05, "Splice Insert"),
    (0x06, "Time Signal"),
    (0x07, "Bandwidth Reservation"),
    (0xFF, "Private Command"),
];

/// Resolves a 2-bit device restriction code.
pub fn device_restriction(code: u8) -> &'static str {
    DEVICE_RESTRICTIONS[(code & 0b11) as usize]
}

/// Looks up the message for a `segmentation_type_id`.
pub fn segmentation_message(type_id: u8) -> Option<&'static str> {
    lookup(SEGMENTATION_MESSAGES, type_id)
}

/// Looks up the name of a `segmentation_upid_type`.
pub fn upid_name(upid_type: u8) -> &'static str {
    lookup(UPID_NAMES, upid_type).unwrap_or(UNKNOWN_UPID_NAME)
}

/// Looks up the name of a `splice_command_type`.
pub fn splice_command_name(command_type: u8) -> Option<&'static str> {
    lookup(SPLICE_COMMANDS, command_type)
}

/// Whether `type_id` carries sub-segment fields.
pub fn has_sub_segments(type_id: u8) -> bool {
    SUB_SEGMENT_TYPES.contains(&type_id)
}

fn lookup(table: &[(u8, &'static str)], key: u8) -> Option<&'static str> {
    table
        .iter()
        .find_map(|&(code, label)| (code == key).then_some(label))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_restrictions() {
        assert_eq!(device_restriction(0), "Restrict Group 0");
        assert_eq!(device_restriction(1), "Restrict Group 1");
        assert_eq!(device_restriction(2), "Restrict Group 2");
        assert_eq!(device_restriction(3), "None");
    }

    #[test]
    fn test_segmentation_messages() {
        assert_eq!(segmentation_message(0x22), Some("Break Start"));
        assert_eq!(
            segmentation_message(0x34),
            Some("Provider Placement Opportunity Start")
        );
        assert_eq!(segmentation_message(0x51), Some("Network End"));
        assert_eq!(segmentation_message(0x70), None);
        assert_eq!(segmentation_message(0xFF), None);
    }

    #[test]
    fn test_tables_are_sorted_and_unique() {
        for table in [SEGMENTATION_MESSAGES, UPID_NAMES, SPLICE_COMMANDS] {
            assert!(table.windows(2).all(|w| w[0].0 < w[1].0));
        }
    }

    #[test]
    fn test_upid_names() {
        assert_eq!(upid_name(0x0F), "URI");
        assert_eq!(upid_name(0x0D), "MID");
        assert_eq!(upid_name(0x04), "UPID");
        assert_eq!(upid_name(0xFE), "UPID");
    }

    #[test]
    fn test_splice_command_names() {
        assert_eq!(splice_command_name(0x06), Some("Time Signal"));
        assert_eq!(splice_command_name(0xFF), Some("Private Command"));
        assert_eq!(splice_command_name(0x01), None);
    }

    #[test]
    fn test_sub_segment_types() {
        assert!(has_sub_segments(0x34));
        assert!(has_sub_segments(0x3A));
        assert!(!has_sub_segments(0x22));
        assert!(!has_sub_segments(0x35));
    }
}
