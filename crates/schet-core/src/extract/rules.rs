//! Rule-set configuration: ordered, prioritized extraction patterns.
//!
//! The rule-set is an externally owned JSON document edited by operator
//! tooling. The pipeline takes it as a read-only value per run and never
//! mutates it; callers re-read the file at the start of each run so edits
//! take effect on the next document.

use serde::{Deserialize, Serialize};

use crate::models::FieldKind;

/// One pattern-based extraction rule within a field's rule-set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionRule {
    /// Regex applied to the full transcription text.
    pub pattern: String,
    /// Lower value = higher precedence.
    pub priority: u32,
    /// Human description, also used as rule identity in diagnostics.
    pub description: String,
    /// Inactive rules are skipped entirely.
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl ExtractionRule {
    pub fn new(pattern: &str, priority: u32, description: &str) -> Self {
        Self {
            pattern: pattern.to_string(),
            priority,
            description: description.to_string(),
            active: true,
        }
    }
}

/// Rule-sets keyed by field kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleSet {
    pub invoice_number: Vec<ExtractionRule>,
    pub invoice_date: Vec<ExtractionRule>,
    pub due_date: Vec<ExtractionRule>,
    pub total_amount: Vec<ExtractionRule>,
    pub vat_amount: Vec<ExtractionRule>,
    pub contractor_name: Vec<ExtractionRule>,
    pub tax_id: Vec<ExtractionRule>,
}

impl RuleSet {
    /// Rules for one field kind, in declaration order.
    pub fn rules(&self, kind: FieldKind) -> &[ExtractionRule] {
        match kind {
            FieldKind::InvoiceNumber => &self.invoice_number,
            FieldKind::InvoiceDate => &self.invoice_date,
            FieldKind::DueDate => &self.due_date,
            FieldKind::TotalAmount => &self.total_amount,
            FieldKind::VatAmount => &self.vat_amount,
            FieldKind::ContractorName => &self.contractor_name,
            FieldKind::TaxId => &self.tax_id,
        }
    }

    pub fn rules_mut(&mut self, kind: FieldKind) -> &mut Vec<ExtractionRule> {
        match kind {
            FieldKind::InvoiceNumber => &mut self.invoice_number,
            FieldKind::InvoiceDate => &mut self.invoice_date,
            FieldKind::DueDate => &mut self.due_date,
            FieldKind::TotalAmount => &mut self.total_amount,
            FieldKind::VatAmount => &mut self.vat_amount,
            FieldKind::ContractorName => &mut self.contractor_name,
            FieldKind::TaxId => &mut self.tax_id,
        }
    }

    /// Active rules for a kind, stably ordered by (priority, declaration
    /// index). This iteration order is the tie-break for equal priorities
    /// downstream, so it must be reproducible.
    pub fn active_sorted(&self, kind: FieldKind) -> Vec<(usize, &ExtractionRule)> {
        let mut rules: Vec<(usize, &ExtractionRule)> = self
            .rules(kind)
            .iter()
            .enumerate()
            .filter(|(_, r)| r.active)
            .collect();
        rules.sort_by_key(|(index, rule)| (rule.priority, *index));
        rules
    }

    /// Load a rule-set from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    }

    /// Save the rule-set to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        std::fs::write(path, content)
    }

    /// Built-in rule-set for Russian supplier invoices (счета).
    pub fn default_rules() -> Self {
        Self {
            invoice_number: vec![
                ExtractionRule::new(
                    r"№\s*([А-ЯЁA-Z]+-\d+)",
                    1,
                    "Буквенно-цифровой номер (УТ-784, А-123)",
                ),
                ExtractionRule::new(
                    r"(?i)сч[её]т.*?№\s*([А-ЯЁA-Z]+-\d+)",
                    1,
                    "СЧЁТ с буквенно-цифровым номером",
                ),
                ExtractionRule::new(
                    r"(?i)сч[её]т[-\s]*договор.*?№\s*(\d+)",
                    2,
                    "СЧЁТ-ДОГОВОР с номером",
                ),
                ExtractionRule::new(r"№\s*(0+\d+)\s*от", 2, "Номер с ведущими нулями"),
                ExtractionRule::new(r"(?i)сч[её]т.*?№\s*(\d+)", 3, "СЧЁТ с номером"),
                ExtractionRule::new(r"№\s*(\d+)\s*от\s*\d", 3, "№ НОМЕР от ДАТА"),
                ExtractionRule::new(r"(?i)с[чт]\s+(\d+)\s+от", 4, "OCR-искажение СЧ→СТ"),
                ExtractionRule::new(r"№\s*(\d{2,10})\s*от", 4, "Универсальный номер"),
            ],
            invoice_date: vec![
                ExtractionRule::new(
                    r"(?i)(\d{1,2}\s+(?:января|февраля|марта|апреля|мая|июня|июля|августа|сентября|октября|ноября|декабря)\s+\d{4})",
                    1,
                    "Дата с названием месяца",
                ),
                ExtractionRule::new(
                    r"(?i)от\s+(\d{1,2}[./]\d{1,2}[./]\d{4})",
                    1,
                    "Дата после «от»",
                ),
                ExtractionRule::new(r"(\d{1,2}\.\d{1,2}\.\d{4})", 2, "ДД.ММ.ГГГГ"),
                ExtractionRule::new(r"(\d{1,2}/\d{1,2}/\d{4})", 2, "ДД/ММ/ГГГГ"),
                ExtractionRule::new(r"(\d{4}-\d{1,2}-\d{1,2})", 3, "ГГГГ-ММ-ДД"),
            ],
            due_date: vec![
                ExtractionRule::new(
                    r"(?i)(?:оплатить|оплата).*?не\s+позднее\s+(\d{1,2}\.\d{1,2}\.\d{4})",
                    1,
                    "Оплатить не позднее ДАТА",
                ),
                ExtractionRule::new(
                    r"(?i)не\s+позднее\s+(\d{1,2}\.\d{1,2}\.\d{4})",
                    2,
                    "Не позднее ДАТА",
                ),
                ExtractionRule::new(
                    r"(?i)срок\s+оплаты[\s:]*(\d{1,2}\.\d{1,2}\.\d{4})",
                    2,
                    "Срок оплаты",
                ),
            ],
            total_amount: vec![
                ExtractionRule::new(
                    r"(?i)всего\s*к\s*оплате[\s:]*([0-9]{1,3}(?:[\s,.][0-9]{3})*[.,]\d{2})",
                    1,
                    "Всего к оплате",
                ),
                ExtractionRule::new(
                    r"(?i)итого[\s:]*([0-9]{1,3}(?:[\s,.][0-9]{3})*[.,]\d{2})",
                    1,
                    "Итого",
                ),
                ExtractionRule::new(
                    r"(?i)к\s*доплате[\s:]*([0-9]{1,3}(?:[\s,.][0-9]{3})*[.,]\d{2})",
                    1,
                    "К доплате",
                ),
                ExtractionRule::new(
                    r"(?i)всего[\s:]*([0-9]{1,3}(?:[\s,.][0-9]{3})*[.,]\d{2})",
                    1,
                    "Общий итог",
                ),
                ExtractionRule::new(
                    r"(?i)общая\s*стоимость[\s:]*([0-9]{1,3}(?:[\s,.][0-9]{3})*[.,]\d{2})",
                    1,
                    "Общая стоимость",
                ),
                ExtractionRule::new(r"([0-9]{4,}[.,]\d{2})\s*руб", 2, "Крупная сумма с «руб»"),
                ExtractionRule::new(r"([0-9]{6,}[.,]\d{2})", 3, "Очень большое число"),
            ],
            vat_amount: vec![
                ExtractionRule::new(
                    r"(?i)(?:в\s*т\.?\s*ч\.?|в\s*том\s*числе)\s*ндс[^0-9]{0,20}([0-9]{1,3}(?:[\s,.][0-9]{3})*[.,]\d{2})",
                    1,
                    "В т.ч. НДС",
                ),
                ExtractionRule::new(
                    r"(?i)ндс\s*\(?\d{1,2}\s*%\)?[\s:]*([0-9]{1,3}(?:[\s,.][0-9]{3})*[.,]\d{2})",
                    2,
                    "НДС со ставкой",
                ),
                ExtractionRule::new(
                    r"(?i)ндс[\s:]*([0-9]{1,3}(?:[\s,.][0-9]{3})*[.,]\d{2})",
                    3,
                    "НДС",
                ),
            ],
            contractor_name: vec![
                ExtractionRule::new(
                    r"(?i)поставщик:\s*([^\n\r,]+?)(?:,|\s+ИНН|\s+КПП|\s+Адрес:|\s+тел\.|\s*$)",
                    1,
                    "Поставщик: НАЗВАНИЕ",
                ),
                ExtractionRule::new(
                    r#"(?i)получатель[\s\S]{0,120}?(?:ООО|ИП|ЗАО|ПАО|АО)\s*[«"]?([^«»"\n\r]+?)[»"]?\s*(?:Сч\.|ИНН|$)"#,
                    1,
                    "Получатель в банковских реквизитах",
                ),
                ExtractionRule::new(
                    r#"(?:ООО|ИП|ЗАО|ПАО|АО)\s*[«"]([^«»"\n\r,]{2,60})[»"]"#,
                    2,
                    "Первая организация в кавычках",
                ),
            ],
            tax_id: vec![
                ExtractionRule::new(
                    r"(?i)поставщик[\s\S]{0,200}?ИНН[\s:]*(\d{10,12})",
                    1,
                    "ИНН в секции поставщика",
                ),
                ExtractionRule::new(r"(?i)ИНН[\s:]*(\d{10,12})", 2, "Любой ИНН"),
                ExtractionRule::new(
                    r"(?i)получатель[\s\S]{0,200}?ИНН[\s:]*(\d{10,12})",
                    2,
                    "ИНН в банковских реквизитах",
                ),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rules_all_compile() {
        let rules = RuleSet::default_rules();
        for kind in FieldKind::ALL {
            for rule in rules.rules(kind) {
                assert!(
                    regex::Regex::new(&rule.pattern).is_ok(),
                    "pattern does not compile: {}",
                    rule.pattern
                );
            }
        }
    }

    #[test]
    fn active_sorted_orders_by_priority_then_declaration() {
        let mut rules = RuleSet::default();
        rules.invoice_number = vec![
            ExtractionRule::new("b", 2, "second by priority"),
            ExtractionRule::new("a", 1, "first by priority"),
            ExtractionRule::new("c", 1, "after a, same priority"),
        ];

        let sorted = rules.active_sorted(FieldKind::InvoiceNumber);
        let patterns: Vec<&str> = sorted.iter().map(|(_, r)| r.pattern.as_str()).collect();
        assert_eq!(patterns, vec!["a", "c", "b"]);
    }

    #[test]
    fn inactive_rules_are_skipped() {
        let mut rules = RuleSet::default();
        let mut rule = ExtractionRule::new("x", 1, "disabled");
        rule.active = false;
        rules.tax_id.push(rule);

        assert!(rules.active_sorted(FieldKind::TaxId).is_empty());
    }

    #[test]
    fn json_round_trip_preserves_rules() {
        let rules = RuleSet::default_rules();
        let json = serde_json::to_string(&rules).unwrap();
        let back: RuleSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back.total_amount.len(), rules.total_amount.len());
        assert_eq!(back.total_amount[0].priority, 1);
        assert!(back.total_amount[0].active);
    }

    #[test]
    fn missing_active_flag_defaults_to_true() {
        let json = r#"{"tax_id":[{"pattern":"x","priority":1,"description":"d"}]}"#;
        let rules: RuleSet = serde_json::from_str(json).unwrap();
        assert!(rules.tax_id[0].active);
    }
}
