//! Arabic Contextual Shaping
//!
//! Joining analysis and presentation-form substitution used by the fallback
//! path when no complex backend is available. Substitution works in place on
//! a fixed-length UTF-16 buffer: a Lam-Alef ligature keeps its second slot
//! as `NO_CHAR` so every offset after it stays valid.

/// Placeholder left where a ligature absorbed a code unit
pub const NO_CHAR: u16 = 0xFFFF;

/// Arabic joining type (from Unicode data)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoiningType {
    /// Joins on its right side only (to the preceding letter)
    Right,
    /// Joins on its left side only (to the following letter) - rare
    Left,
    /// Joins on both sides
    Dual,
    /// Causes joining but doesn't change form itself
    Causing,
    #[default]
    NonJoining,
    /// Marks, skipped by joining analysis
    Transparent,
}

/// Arabic positional form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionalForm {
    Isolated,
    Initial,
    Medial,
    Final,
}

/// Get joining type for a character
pub fn joining_type(c: char) -> JoiningType {
    let code = c as u32;

    match code {
        0x0622 | // Alef with madda
        0x0623 | // Alef with hamza above
        0x0624 | // Waw with hamza
        0x0625 | // Alef with hamza below
        0x0627 | // Alef
        0x0629 | // Teh marbuta
        0x062F | // Dal
        0x0630 | // Thal
        0x0631 | // Reh
        0x0632 | // Zain
        0x0648 | // Waw
        0x0671..=0x0673 |
        0x0675..=0x0677 |
        0x0688..=0x0699 |
        0x06C0 |
        0x06C3..=0x06CB |
        0x06CD |
        0x06CF |
        0x06D2 |
        0x06D3 |
        0x06D5 |
        0x06EE..=0x06EF => JoiningType::Right,

        0x0626 | // Yeh with hamza
        0x0628 | // Beh
        0x062A..=0x062E | // Teh, Theh, Jeem, Hah, Khah
        0x0633..=0x063F | // Seen through Ghain
        0x0641..=0x0647 | // Feh through Heh
        0x0649..=0x064A | // Alef maksura, Yeh
        0x066E..=0x066F |
        0x0678..=0x0687 |
        0x069A..=0x06BF |
        0x06C1..=0x06C2 |
        0x06CC |
        0x06CE |
        0x06D0..=0x06D1 |
        0x06FA..=0x06FC |
        0x06FF |
        0x0750..=0x077F | // Arabic Supplement
        0x08A0..=0x08B4 |
        0x08B6..=0x08C7 => JoiningType::Dual,

        0x064B..=0x065F | // Harakat
        0x0670 | // Superscript alef
        0x06D6..=0x06DC |
        0x06DF..=0x06E4 |
        0x06E7..=0x06E8 |
        0x06EA..=0x06ED |
        0x08D3..=0x08E1 |
        0x08E3..=0x08FF |
        0xFE00..=0xFE0F => JoiningType::Transparent,

        0x200D => JoiningType::Causing, // ZWJ
        0x200C => JoiningType::NonJoining, // ZWNJ

        // Syriac
        0x0710 | 0x0712..=0x072F | 0x074D..=0x074F => JoiningType::Dual,
        0x0711 => JoiningType::Right,
        0x0730..=0x074A => JoiningType::Transparent,

        // N'Ko
        0x07CA..=0x07EA => JoiningType::Dual,
        0x07EB..=0x07F3 | 0x07FD => JoiningType::Transparent,

        // Mandaic
        0x0840..=0x0858 => JoiningType::Dual,
        0x0859..=0x085B => JoiningType::Transparent,

        _ => JoiningType::NonJoining,
    }
}

fn unit_char(unit: u16) -> char {
    char::from_u32(unit as u32).unwrap_or(char::REPLACEMENT_CHARACTER)
}

/// Joining analysis over a UTF-16 buffer
#[derive(Debug, Default)]
pub struct ArabicShaper {
    joining_types: Vec<JoiningType>,
    forms: Vec<PositionalForm>,
}

impl ArabicShaper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a positional form for every code unit
    pub fn analyze(&mut self, units: &[u16]) {
        self.joining_types.clear();
        self.joining_types.extend(units.iter().map(|&u| joining_type(unit_char(u))));
        self.forms.clear();
        self.forms.resize(units.len(), PositionalForm::Isolated);

        for i in 0..units.len() {
            let joins_prev = self.can_join_previous(i);
            let joins_next = self.can_join_next(i);

            self.forms[i] = match self.joining_types[i] {
                JoiningType::Right if joins_prev => PositionalForm::Final,
                JoiningType::Left if joins_next => PositionalForm::Initial,
                JoiningType::Dual => match (joins_prev, joins_next) {
                    (true, true) => PositionalForm::Medial,
                    (true, false) => PositionalForm::Final,
                    (false, true) => PositionalForm::Initial,
                    (false, false) => PositionalForm::Isolated,
                },
                _ => PositionalForm::Isolated,
            };
        }
    }

    /// Nearest non-transparent letter before `pos` joins on its left side
    fn can_join_previous(&self, pos: usize) -> bool {
        self.joining_types[..pos]
            .iter()
            .rev()
            .find(|&&jt| jt != JoiningType::Transparent)
            .is_some_and(|&jt| matches!(jt, JoiningType::Dual | JoiningType::Left | JoiningType::Causing))
    }

    /// Nearest non-transparent letter after `pos` joins on its right side
    fn can_join_next(&self, pos: usize) -> bool {
        self.joining_types[pos + 1..]
            .iter()
            .find(|&&jt| jt != JoiningType::Transparent)
            .is_some_and(|&jt| matches!(jt, JoiningType::Dual | JoiningType::Right | JoiningType::Causing))
    }

    pub fn form(&self, index: usize) -> Option<PositionalForm> {
        self.forms.get(index).copied()
    }

    pub fn forms(&self) -> &[PositionalForm] {
        &self.forms
    }
}

/// Maps base character + form to an Arabic Presentation Forms-B codepoint
pub fn get_presentation_form(c: char, form: PositionalForm) -> Option<char> {
    let code = c as u32;

    let base = match code {
        0x0621 => 0xFE80, // Hamza
        0x0622 => 0xFE81, // Alef with madda
        0x0623 => 0xFE83, // Alef with hamza above
        0x0624 => 0xFE85, // Waw with hamza
        0x0625 => 0xFE87, // Alef with hamza below
        0x0626 => 0xFE89, // Yeh with hamza
        0x0627 => 0xFE8D, // Alef
        0x0628 => 0xFE8F, // Beh
        0x0629 => 0xFE93, // Teh marbuta
        0x062A => 0xFE95, // Teh
        0x062B => 0xFE99, // Theh
        0x062C => 0xFE9D, // Jeem
        0x062D => 0xFEA1, // Hah
        0x062E => 0xFEA5, // Khah
        0x062F => 0xFEA9, // Dal
        0x0630 => 0xFEAB, // Thal
        0x0631 => 0xFEAD, // Reh
        0x0632 => 0xFEAF, // Zain
        0x0633 => 0xFEB1, // Seen
        0x0634 => 0xFEB5, // Sheen
        0x0635 => 0xFEB9, // Sad
        0x0636 => 0xFEBD, // Dad
        0x0637 => 0xFEC1, // Tah
        0x0638 => 0xFEC5, // Zah
        0x0639 => 0xFEC9, // Ain
        0x063A => 0xFECD, // Ghain
        0x0641 => 0xFED1, // Feh
        0x0642 => 0xFED5, // Qaf
        0x0643 => 0xFED9, // Kaf
        0x0644 => 0xFEDD, // Lam
        0x0645 => 0xFEE1, // Meem
        0x0646 => 0xFEE5, // Noon
        0x0647 => 0xFEE9, // Heh
        0x0648 => 0xFEED, // Waw
        0x0649 => 0xFEEF, // Alef maksura
        0x064A => 0xFEF1, // Yeh
        _ => return None,
    };

    if code == 0x0621 {
        return char::from_u32(base);
    }

    let has_four_forms = matches!(code,
        0x0626 | 0x0628 | 0x062A..=0x062E |
        0x0633..=0x063A | 0x0641..=0x0647 | 0x064A
    );

    let offset = if has_four_forms {
        match form {
            PositionalForm::Isolated => 0,
            PositionalForm::Final => 1,
            PositionalForm::Initial => 2,
            PositionalForm::Medial => 3,
        }
    } else {
        // Right-joining letters only have isolated and final
        match form {
            PositionalForm::Isolated | PositionalForm::Initial => 0,
            PositionalForm::Final | PositionalForm::Medial => 1,
        }
    };

    char::from_u32(base + offset)
}

/// Lam followed by one of the alefs that ligate with it
pub fn is_lam_alef_sequence(first: char, second: char) -> bool {
    first == '\u{0644}' && matches!(second, '\u{0622}' | '\u{0623}' | '\u{0625}' | '\u{0627}')
}

/// Lam-Alef ligature in the form the lam would have taken
pub fn lam_alef_ligature(alef: char, lam_form: PositionalForm) -> Option<char> {
    let base = match alef {
        '\u{0622}' => 0xFEF5,
        '\u{0623}' => 0xFEF7,
        '\u{0625}' => 0xFEF9,
        '\u{0627}' => 0xFEFB,
        _ => return None,
    };

    // the ligature only joins on its right side
    let offset = match lam_form {
        PositionalForm::Isolated | PositionalForm::Initial => 0,
        PositionalForm::Final | PositionalForm::Medial => 1,
    };

    char::from_u32(base + offset)
}

/// Replace Arabic letters with their contextual presentation forms in place.
///
/// The buffer never changes length. The alef of a Lam-Alef ligature becomes
/// `NO_CHAR`; callers strip those before glyph lookup.
pub fn shape_fixed_length(units: &mut [u16]) {
    let mut shaper = ArabicShaper::new();
    shaper.analyze(units);

    let mut i = 0;
    while i < units.len() {
        let c = unit_char(units[i]);
        let form = shaper.forms()[i];

        if let Some(&next) = units.get(i + 1) {
            let alef = unit_char(next);
            if is_lam_alef_sequence(c, alef) {
                if let Some(ligature) = lam_alef_ligature(alef, form) {
                    units[i] = ligature as u16;
                    units[i + 1] = NO_CHAR;
                    i += 2;
                    continue;
                }
            }
        }

        if let Some(presentation) = get_presentation_form(c, form) {
            units[i] = presentation as u16;
        }
        i += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf16(s: &str) -> Vec<u16> {
        s.encode_utf16().collect()
    }

    #[test]
    fn test_joining_types() {
        assert_eq!(joining_type('\u{0627}'), JoiningType::Right);
        assert_eq!(joining_type('\u{0628}'), JoiningType::Dual);
        assert_eq!(joining_type(' '), JoiningType::NonJoining);
        assert_eq!(joining_type('\u{064E}'), JoiningType::Transparent);
    }

    #[test]
    fn test_isolated_alef() {
        let mut shaper = ArabicShaper::new();
        shaper.analyze(&utf16("ا"));
        assert_eq!(shaper.form(0), Some(PositionalForm::Isolated));
    }

    #[test]
    fn test_word_forms() {
        let mut shaper = ArabicShaper::new();
        shaper.analyze(&utf16("بسم"));
        assert_eq!(shaper.forms(), &[PositionalForm::Initial, PositionalForm::Medial, PositionalForm::Final]);
    }

    #[test]
    fn test_right_joining_takes_final_after_dual() {
        let mut shaper = ArabicShaper::new();
        // beh + alef + beh: alef joins back to beh but breaks the chain forward
        shaper.analyze(&utf16("باب"));
        assert_eq!(shaper.forms(), &[PositionalForm::Initial, PositionalForm::Final, PositionalForm::Isolated]);
    }

    #[test]
    fn test_marks_are_transparent() {
        let mut shaper = ArabicShaper::new();
        // beh, fatha, seen
        shaper.analyze(&utf16("\u{0628}\u{064E}\u{0633}"));
        assert_eq!(shaper.form(0), Some(PositionalForm::Initial));
        assert_eq!(shaper.form(2), Some(PositionalForm::Final));
    }

    #[test]
    fn test_presentation_forms() {
        assert_eq!(get_presentation_form('\u{0628}', PositionalForm::Initial), Some('\u{FE91}'));
        assert_eq!(get_presentation_form('\u{0627}', PositionalForm::Final), Some('\u{FE8E}'));
        assert_eq!(get_presentation_form('\u{0621}', PositionalForm::Final), Some('\u{FE80}'));
        assert_eq!(get_presentation_form('a', PositionalForm::Isolated), None);
    }

    #[test]
    fn test_shape_fixed_length_keeps_offsets() {
        // lam + alef + beh
        let mut units = utf16("\u{0644}\u{0627}\u{0628}");
        shape_fixed_length(&mut units);
        assert_eq!(units.len(), 3);
        assert_eq!(units[0], 0xFEFB);
        assert_eq!(units[1], NO_CHAR);
        assert_eq!(units[2], 0xFE8F);
    }

    #[test]
    fn test_shape_fixed_length_leaves_latin() {
        let mut units = utf16("abc");
        shape_fixed_length(&mut units);
        assert_eq!(units, utf16("abc"));
    }
}
