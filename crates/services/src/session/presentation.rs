use rand::Rng;
use rand::seq::SliceRandom;

use exam_core::model::{Question, QuestionKind};

/// Per-question display data fixed once at session build time.
///
/// The shuffled orders live on the session, not in the rendering layer, so
/// every view of the question during the attempt shows the same
/// arrangement and grading never depends on display state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Presentation {
    /// Ordering items in the order they are presented for sequencing.
    Ordering { display_items: Vec<String> },
    /// Matching right column in the order it is presented.
    Matching { right_column: Vec<String> },
}

impl Presentation {
    /// Build the presentation for a question, if its type has one.
    ///
    /// With `shuffle` off the declared order is kept, which keeps
    /// deterministic tests simple.
    #[must_use]
    pub fn for_question<R: Rng>(question: &Question, shuffle: bool, rng: &mut R) -> Option<Self> {
        match &question.kind {
            QuestionKind::Ordering { items, .. } => {
                let mut display_items = items.clone();
                if shuffle {
                    display_items.shuffle(rng);
                }
                Some(Presentation::Ordering { display_items })
            }
            QuestionKind::Matching { pairs } => {
                let mut right_column: Vec<String> =
                    pairs.iter().map(|p| p.right.clone()).collect();
                if shuffle {
                    right_column.shuffle(rng);
                }
                Some(Presentation::Matching { right_column })
            }
            _ => None,
        }
    }
}
