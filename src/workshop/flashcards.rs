//! Picture flashcards over the enriched vocabulary.

use base64::Engine as _;

use crate::session::Vocabulary;

/// Inline SVG card showing the first four characters of `word`, as a
/// base64 data URI.
pub fn placeholder_image(word: &str) -> String {
    let label: String = word.chars().take(4).collect();
    let svg = format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="400" height="300"><rect width="400" height="300" rx="24" fill="#e0f2f1"/><text x="200" y="160" font-size="64" font-family="'KaiTi','STKaiti',serif" font-weight="700" fill="#0f766e" text-anchor="middle" dominant-baseline="middle">{}</text></svg>"##,
        super::cloze::escape_html(&label)
    );
    format!(
        "data:image/svg+xml;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(svg)
    )
}

/// Give every entry without an image a placeholder.
pub fn with_placeholders(mut vocab: Vec<Vocabulary>) -> Vec<Vocabulary> {
    for v in &mut vocab {
        let missing = v.image_url.as_deref().map_or(true, |url| url.trim().is_empty());
        if missing {
            v.image_url = Some(placeholder_image(&v.word));
        }
    }
    vocab
}

/// Focused-card view with cyclic navigation.  Navigating always shows
/// the front of the next card.
#[derive(Debug, Default)]
pub struct Flashcards {
    cards: Vec<Vocabulary>,
    focused: Option<usize>,
    flipped: bool,
}

impl Flashcards {
    pub fn new(cards: Vec<Vocabulary>) -> Self {
        Self {
            cards,
            focused: None,
            flipped: false,
        }
    }

    pub fn cards(&self) -> &[Vocabulary] {
        &self.cards
    }

    pub fn focused(&self) -> Option<&Vocabulary> {
        self.focused.and_then(|i| self.cards.get(i))
    }

    pub fn focused_index(&self) -> Option<usize> {
        self.focused
    }

    pub fn is_flipped(&self) -> bool {
        self.flipped
    }

    /// Open card `index`.  Returns `false` when out of range.
    pub fn focus(&mut self, index: usize) -> bool {
        if index >= self.cards.len() {
            return false;
        }
        self.focused = Some(index);
        self.flipped = false;
        true
    }

    pub fn next(&mut self) {
        let n = self.cards.len();
        if let Some(i) = self.focused {
            self.focused = Some((i + 1) % n);
            self.flipped = false;
        }
    }

    pub fn prev(&mut self) {
        let n = self.cards.len();
        if let Some(i) = self.focused {
            self.focused = Some((i + n - 1) % n);
            self.flipped = false;
        }
    }

    pub fn flip(&mut self) {
        if self.focused.is_some() {
            self.flipped = !self.flipped;
        }
    }

    pub fn close(&mut self) {
        self.focused = None;
        self.flipped = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(w: &str, image: Option<&str>) -> Vocabulary {
        Vocabulary {
            word: w.into(),
            image_url: image.map(str::to_string),
            ..Vocabulary::default()
        }
    }

    #[test]
    fn placeholder_is_svg_data_uri() {
        let uri = placeholder_image("亭亭玉立的荷花");
        let body = uri.strip_prefix("data:image/svg+xml;base64,").unwrap();
        let svg = String::from_utf8(
            base64::engine::general_purpose::STANDARD
                .decode(body)
                .unwrap(),
        )
        .unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains(">亭亭玉立</text>"));
    }

    #[test]
    fn existing_images_are_kept() {
        let cards = with_placeholders(vec![
            word("荷塘", Some("https://img/1.png")),
            word("弥望", None),
            word("田田", Some(" ")),
        ]);
        assert_eq!(cards[0].image_url.as_deref(), Some("https://img/1.png"));
        assert!(cards[1].image_url.as_deref().unwrap().starts_with("data:image/svg+xml"));
        assert!(cards[2].image_url.as_deref().unwrap().starts_with("data:image/svg+xml"));
    }

    #[test]
    fn navigation_wraps_and_resets_flip() {
        let mut cards = Flashcards::new(vec![word("a", None), word("b", None), word("c", None)]);
        cards.next();
        assert_eq!(cards.focused_index(), None);

        assert!(cards.focus(2));
        cards.flip();
        assert!(cards.is_flipped());
        cards.next();
        assert_eq!(cards.focused_index(), Some(0));
        assert!(!cards.is_flipped());
        cards.prev();
        assert_eq!(cards.focused().unwrap().word, "c");

        cards.close();
        assert!(cards.focused().is_none());
        assert!(!cards.focus(3));
    }
}
