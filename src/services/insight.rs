//! AI-assisted insights
//!
//! The text generator only ever narrates figures computed here or pulls
//! transactions out of a document. Its output is never trusted as data
//! until it has parsed as the exact JSON shape we expect.

use std::fmt::Write as _;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::ai::TextGenerator;
use crate::error::{FinanceError, FinanceResult};
use crate::models::{ExpenseCategory, Money, PaymentMethod, UserId};
use crate::storage::Storage;

use super::summary::FinancialSummary;
use super::transaction::{NewExpense, TransactionService};

/// Returned instead of calling the generator when there is too little history
pub const NOT_ENOUGH_DATA: &str = "Not enough data for meaningful analysis";

/// Fewest expenses worth asking about
pub const MIN_EXPENSES_FOR_INSIGHTS: usize = 10;

/// Document text beyond this many characters is dropped before prompting
pub const MAX_DOCUMENT_CHARS: usize = 10_000;

/// One transaction pulled out of a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedTransaction {
    pub date: NaiveDate,
    pub description: String,
    pub amount: f64,
    pub category: String,
}

impl ExtractedTransaction {
    /// Amount in cents; statements often list debits as negatives
    pub fn money(&self) -> Money {
        Money::from_cents((self.amount.abs() * 100.0).round() as i64)
    }
}

/// Service for narration and document extraction
pub struct InsightService<'a> {
    storage: &'a Storage,
    generator: &'a dyn TextGenerator,
}

impl<'a> InsightService<'a> {
    pub fn new(storage: &'a Storage, generator: &'a dyn TextGenerator) -> Self {
        Self { storage, generator }
    }

    /// Ask for spending patterns across all of the user's expenses
    pub fn spending_insights(&self, user: UserId) -> FinanceResult<String> {
        let expenses = self.storage.store().list_expenses(user, None)?;
        if expenses.len() < MIN_EXPENSES_FOR_INSIGHTS {
            debug!(count = expenses.len(), "too few expenses for insights");
            return Ok(NOT_ENOUGH_DATA.to_string());
        }

        let mut prompt = String::from(
            "Analyze these financial transactions and provide insights:\n\n\
             date | category | amount | payment method | description\n",
        );
        for e in &expenses {
            let _ = writeln!(
                prompt,
                "{} | {} | {} | {} | {}",
                e.date, e.category, e.amount, e.payment_method, e.description
            );
        }
        prompt.push_str(
            "\nProvide:\n\
             1. Top spending categories\n\
             2. Unusual spending patterns\n\
             3. Potential savings opportunities\n\
             4. Weekly/Monthly trends\n\
             5. Personalized recommendations\n\n\
             Format as markdown with bullet points.",
        );

        self.generator.generate(&prompt)
    }

    /// Describe an already computed summary in plain language
    pub fn narrate_summary(&self, summary: &FinancialSummary) -> FinanceResult<String> {
        if summary.expense_count < MIN_EXPENSES_FOR_INSIGHTS {
            debug!(count = summary.expense_count, "too few expenses to narrate");
            return Ok(NOT_ENOUGH_DATA.to_string());
        }
        self.generator.generate(&summary_prompt(summary))
    }

    /// Pull transactions out of a document's text
    ///
    /// `kind` describes the document, e.g. "bank statement" or "text/csv".
    pub fn extract_transactions(
        &self,
        document: &str,
        kind: &str,
    ) -> FinanceResult<Vec<ExtractedTransaction>> {
        let truncated: String = document.chars().take(MAX_DOCUMENT_CHARS).collect();
        let prompt = format!(
            "Extract financial transactions from this {} document.\n\
             Return only a JSON array of objects with fields: \
             date (YYYY-MM-DD), description (string), amount (number), category (string).\n\n\
             Document content:\n{}",
            kind, truncated
        );

        let response = self.generator.generate(&prompt)?;
        parse_extraction(&response)
    }

    /// Record extracted transactions as expenses, returning how many were saved
    ///
    /// Every item is checked before anything is written. Items that would
    /// be rejected (a zero amount, an over-long description) are skipped
    /// with a warning rather than failing the batch.
    pub fn save_extracted(
        &self,
        user: UserId,
        items: &[ExtractedTransaction],
        today: NaiveDate,
    ) -> FinanceResult<usize> {
        let transactions = TransactionService::new(self.storage, user);

        let mut accepted = Vec::with_capacity(items.len());
        for (idx, item) in items.iter().enumerate() {
            let category = item.category.parse().unwrap_or_else(|_| {
                warn!(category = %item.category, "unknown extracted category, using Other");
                ExpenseCategory::Other
            });
            let input = NewExpense {
                amount: item.money(),
                category,
                date: item.date,
                description: item.description.clone(),
                payment_method: PaymentMethod::Extracted,
                subcategory: None,
            };
            match transactions.check_expense(&input) {
                Ok(()) => accepted.push(input),
                Err(e) => warn!(item = idx + 1, error = %e, "skipping extracted transaction"),
            }
        }

        let saved = accepted.len();
        for input in accepted {
            transactions.add_expense(input, today)?;
        }
        info!(saved, skipped = items.len() - saved, "saved extracted transactions");
        Ok(saved)
    }
}

fn summary_prompt(summary: &FinancialSummary) -> String {
    let mut prompt = format!(
        "Summarize this personal financial position for {} in a short paragraph, \
         then give three bullet-point recommendations. Do not recalculate anything.\n\n\
         Total income: {}\nTotal expenses: {}\nNet balance: {}\nSavings rate: {:.1}%\n",
        summary.window,
        summary.total_income,
        summary.total_expenses,
        summary.net_balance,
        summary.savings_rate()
    );

    if !summary.expenses_by_category.is_empty() {
        prompt.push_str("\nSpending by category:\n");
        for (category, amount) in &summary.expenses_by_category {
            let _ = writeln!(prompt, "- {}: {}", category, amount);
        }
    }
    if !summary.budget_usage.is_empty() {
        prompt.push_str("\nBudgets:\n");
        for usage in summary.budget_usage.values() {
            let _ = writeln!(
                prompt,
                "- {}: spent {} of {} ({:.1}%)",
                usage.category, usage.spent, usage.limit, usage.percentage
            );
        }
    }
    prompt
}

/// Parse a generator response as a JSON array of transactions
///
/// A surrounding markdown code fence is tolerated; anything else that is
/// not exactly the expected shape is an error.
pub fn parse_extraction(response: &str) -> FinanceResult<Vec<ExtractedTransaction>> {
    let body = strip_code_fence(response);
    serde_json::from_str(body).map_err(|e| {
        FinanceError::Insight(format!("Could not read extracted transactions: {}", e))
    })
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the language tag line, if any
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DateWindow, Expense};
    use crate::services::summary::summarize;
    use crate::storage::testing::json_storage;
    use std::cell::RefCell;

    /// Replies with a canned response and remembers the prompts it saw
    struct FakeGenerator {
        reply: String,
        prompts: RefCell<Vec<String>>,
    }

    impl FakeGenerator {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                prompts: RefCell::new(Vec::new()),
            }
        }
    }

    impl TextGenerator for FakeGenerator {
        fn generate(&self, prompt: &str) -> FinanceResult<String> {
            self.prompts.borrow_mut().push(prompt.to_string());
            Ok(self.reply.clone())
        }
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, day).unwrap()
    }

    fn add_expenses(storage: &Storage, count: u32) {
        for day in 1..=count {
            storage
                .store()
                .insert_expense(&Expense::new(
                    UserId::default(),
                    Money::from_dollars(10),
                    ExpenseCategory::Food,
                    date(day),
                ))
                .unwrap();
        }
    }

    #[test]
    fn test_few_expenses_short_circuit() {
        let (storage, _temp) = json_storage();
        add_expenses(&storage, 9);
        let generator = FakeGenerator::new("should not be used");
        let service = InsightService::new(&storage, &generator);

        let text = service.spending_insights(UserId::default()).unwrap();
        assert_eq!(text, NOT_ENOUGH_DATA);
        assert!(generator.prompts.borrow().is_empty());
    }

    #[test]
    fn test_insights_prompt_lists_expenses() {
        let (storage, _temp) = json_storage();
        add_expenses(&storage, 10);
        let generator = FakeGenerator::new("- Eat out less");
        let service = InsightService::new(&storage, &generator);

        let text = service.spending_insights(UserId::default()).unwrap();
        assert_eq!(text, "- Eat out less");
        let prompts = generator.prompts.borrow();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("2025-04-10 | Food"));
    }

    #[test]
    fn test_narration_uses_computed_figures() {
        let (storage, _temp) = json_storage();
        let generator = FakeGenerator::new("You are doing fine.");
        let service = InsightService::new(&storage, &generator);

        let expenses: Vec<Expense> = (1..=10)
            .map(|day| {
                Expense::new(
                    UserId::default(),
                    Money::from_dollars(60),
                    ExpenseCategory::Housing,
                    date(day),
                )
            })
            .collect();
        let summary = summarize(DateWindow::new(date(1), date(30)), &expenses, &[], &[]);
        let text = service.narrate_summary(&summary).unwrap();
        assert_eq!(text, "You are doing fine.");

        let prompts = generator.prompts.borrow();
        assert!(prompts[0].contains("Total expenses: $600.00"));
        assert!(prompts[0].contains("- Housing: $600.00"));
    }

    #[test]
    fn test_narration_needs_enough_expenses() {
        let (storage, _temp) = json_storage();
        let generator = FakeGenerator::new("should not be used");
        let service = InsightService::new(&storage, &generator);

        let expenses: Vec<Expense> = (1..=9)
            .map(|day| {
                Expense::new(
                    UserId::default(),
                    Money::from_dollars(60),
                    ExpenseCategory::Food,
                    date(day),
                )
            })
            .collect();
        let summary = summarize(DateWindow::new(date(1), date(30)), &expenses, &[], &[]);

        assert_eq!(service.narrate_summary(&summary).unwrap(), NOT_ENOUGH_DATA);
        assert!(generator.prompts.borrow().is_empty());
    }

    #[test]
    fn test_extraction_with_code_fence() {
        let (storage, _temp) = json_storage();
        let generator = FakeGenerator::new(
            "```json\n[{\"date\": \"2025-04-03\", \"description\": \"Coffee\", \
             \"amount\": -4.5, \"category\": \"Food\"}]\n```",
        );
        let service = InsightService::new(&storage, &generator);

        let items = service.extract_transactions("statement text", "bank statement").unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].money(), Money::from_cents(450));

        assert_eq!(service.save_extracted(UserId::default(), &items, date(30)).unwrap(), 1);
        let stored = storage.store().list_expenses(UserId::default(), None).unwrap();
        assert_eq!(stored[0].payment_method, PaymentMethod::Extracted);
        assert_eq!(stored[0].category, ExpenseCategory::Food);
    }

    #[test]
    fn test_malformed_extraction_fails_closed() {
        for reply in [
            "Here are your transactions: none",
            "[{\"date\": \"yesterday\", \"description\": \"x\", \
             \"amount\": 1, \"category\": \"Food\"}]",
            "{\"date\": \"2025-04-03\"}",
            "[{\"description\": \"x\", \"amount\": 1, \"category\": \"Food\"}]",
        ] {
            let err = parse_extraction(reply).unwrap_err();
            assert!(matches!(err, FinanceError::Insight(_)), "{}", reply);
        }
    }

    #[test]
    fn test_document_truncated() {
        let (storage, _temp) = json_storage();
        let generator = FakeGenerator::new("[]");
        let service = InsightService::new(&storage, &generator);

        let document = "x".repeat(MAX_DOCUMENT_CHARS + 500);
        assert!(service.extract_transactions(&document, "text").unwrap().is_empty());

        let prompts = generator.prompts.borrow();
        let xs = prompts[0].chars().filter(|c| *c == 'x').count();
        // The instructions contribute a few more
        assert!(xs >= MAX_DOCUMENT_CHARS && xs < MAX_DOCUMENT_CHARS + 10);
    }

    #[test]
    fn test_unknown_extracted_category_is_other() {
        let (storage, _temp) = json_storage();
        let generator = FakeGenerator::new("");
        let service = InsightService::new(&storage, &generator);

        let items = vec![ExtractedTransaction {
            date: date(5),
            description: "Mystery".into(),
            amount: 12.0,
            category: "Gadgets".into(),
        }];
        service.save_extracted(UserId::default(), &items, date(30)).unwrap();
        let stored = storage.store().list_expenses(UserId::default(), None).unwrap();
        assert_eq!(stored[0].category, ExpenseCategory::Other);
    }

    #[test]
    fn test_invalid_extracted_items_are_skipped_before_writing() {
        let (storage, _temp) = json_storage();
        let generator = FakeGenerator::new("");
        let service = InsightService::new(&storage, &generator);

        let items: Vec<ExtractedTransaction> = [10.0, 0.0, 5.0]
            .into_iter()
            .enumerate()
            .map(|(idx, amount)| ExtractedTransaction {
                date: date(idx as u32 + 1),
                description: format!("Line {}", idx + 1),
                amount,
                category: "Food".into(),
            })
            .collect();

        let saved = service.save_extracted(UserId::default(), &items, date(30)).unwrap();
        assert_eq!(saved, 2);

        let stored = storage.store().list_expenses(UserId::default(), None).unwrap();
        assert_eq!(stored.len(), 2);
        assert!(stored.iter().all(|e| e.description != "Line 2"));
    }
}
