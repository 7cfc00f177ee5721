//! Unicode general-category tests used to route characters to scanners.

use unicode_general_category::{get_general_category, GeneralCategory as Gc};

/// Punctuation (`P*`) or symbol (`S*`): the operator scanner's territory.
pub fn is_punct_or_symbol(c: char) -> bool {
    matches!(
        get_general_category(c),
        Gc::ConnectorPunctuation
            | Gc::DashPunctuation
            | Gc::OpenPunctuation
            | Gc::ClosePunctuation
            | Gc::InitialPunctuation
            | Gc::FinalPunctuation
            | Gc::OtherPunctuation
            | Gc::MathSymbol
            | Gc::CurrencySymbol
            | Gc::ModifierSymbol
            | Gc::OtherSymbol
    )
}

/// Decimal digit (`Nd`), in any script.
pub fn is_decimal_digit(c: char) -> bool {
    matches!(get_general_category(c), Gc::DecimalNumber)
}

/// Letter (`L*`).
pub fn is_letter(c: char) -> bool {
    matches!(
        get_general_category(c),
        Gc::UppercaseLetter
            | Gc::LowercaseLetter
            | Gc::TitlecaseLetter
            | Gc::ModifierLetter
            | Gc::OtherLetter
    )
}

/// Characters that occupy a column: letters, marks, numbers, punctuation,
/// symbols and the ASCII space.
pub fn is_printable(c: char) -> bool {
    c == ' '
        || is_letter(c)
        || is_punct_or_symbol(c)
        || matches!(
            get_general_category(c),
            Gc::NonspacingMark
                | Gc::SpacingMark
                | Gc::EnclosingMark
                | Gc::DecimalNumber
                | Gc::LetterNumber
                | Gc::OtherNumber
        )
}
