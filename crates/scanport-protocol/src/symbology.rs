use scanport_core::SymbologyCode;

/// Guess the symbology of a serial frame from its length alone.
///
/// Serial frames carry no type code, so 12 and 13 byte reads are taken as
/// EAN-13/UPC-A, other reads of 4 to 20 bytes as Code 128 and everything else
/// as generic.
///
/// ```
/// use scanport_core::SymbologyCode;
/// use scanport_protocol::classify_symbology;
///
/// assert_eq!(classify_symbology(13), SymbologyCode::EAN13);
/// assert_eq!(classify_symbology(8), SymbologyCode::CODE128);
/// assert_eq!(classify_symbology(0), SymbologyCode::GENERIC);
/// ```
pub fn classify_symbology(frame_length: usize) -> SymbologyCode {
    match frame_length {
        12 | 13 => SymbologyCode::EAN13,
        4..=20 => SymbologyCode::CODE128,
        _ => SymbologyCode::GENERIC,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(12, SymbologyCode::EAN13)]
    #[case(13, SymbologyCode::EAN13)]
    #[case(4, SymbologyCode::CODE128)]
    #[case(11, SymbologyCode::CODE128)]
    #[case(14, SymbologyCode::CODE128)]
    #[case(20, SymbologyCode::CODE128)]
    #[case(0, SymbologyCode::GENERIC)]
    #[case(3, SymbologyCode::GENERIC)]
    #[case(21, SymbologyCode::GENERIC)]
    #[case(25, SymbologyCode::GENERIC)]
    #[case(255, SymbologyCode::GENERIC)]
    fn test_classify_symbology(#[case] len: usize, #[case] expected: SymbologyCode) {
        assert_eq!(classify_symbology(len), expected);
    }
}
