use rand::Rng;
use rand::seq::SliceRandom;

use crate::quiz::question::Question;

/// Draw a uniform permutation of the whole bank and keep the first
/// `min(bank.len(), max_questions)` entries.
pub fn pick_questions<R: Rng + ?Sized>(
    bank: &[Question],
    max_questions: usize,
    rng: &mut R,
) -> Vec<Question> {
    let mut order: Vec<usize> = (0..bank.len()).collect();
    order.shuffle(rng);
    order.truncate(bank.len().min(max_questions));
    order.into_iter().map(|i| bank[i].clone()).collect()
}

/// Display order for a question's options. Presentation only.
pub fn shuffled_options<R: Rng + ?Sized>(question: &Question, rng: &mut R) -> Vec<String> {
    let mut options = question.options.clone();
    options.shuffle(rng);
    options
}
