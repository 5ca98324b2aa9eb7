use rand::Rng;
use rand::seq::SliceRandom;

use quiz_core::model::Question;

/// Returns a uniformly shuffled copy of `questions` (Fisher–Yates).
///
/// The input is left untouched; the result is a permutation of it.
#[must_use]
pub fn shuffled<R: Rng + ?Sized>(questions: &[Question], rng: &mut R) -> Vec<Question> {
    let mut copy = questions.to_vec();
    copy.as_mut_slice().shuffle(rng);
    copy
}
