//! Line-based prompts for the creation and edit forms

use domain_products::models::DEFAULT_MIN_STOCK;
use domain_products::{CreateProduct, Product, UpdateProduct};
use std::fmt::Display;
use std::io::{self, BufRead, Write};
use std::str::FromStr;

pub struct Prompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Print `label` and read one trimmed line. `None` on end of input.
    pub fn ask(&mut self, label: &str) -> io::Result<Option<String>> {
        write!(self.output, "{label}: ")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// Ask until the answer parses. A blank answer yields `default`, or asks
    /// again when there is none.
    pub fn ask_parsed<T>(&mut self, label: &str, default: Option<T>) -> io::Result<Option<T>>
    where
        T: FromStr + Display + Clone,
    {
        let label = match &default {
            Some(d) => format!("{label} [{d}]"),
            None => label.to_string(),
        };

        loop {
            let Some(answer) = self.ask(&label)? else {
                return Ok(None);
            };
            if answer.is_empty() {
                if let Some(d) = &default {
                    return Ok(Some(d.clone()));
                }
                continue;
            }
            match answer.parse() {
                Ok(value) => return Ok(Some(value)),
                Err(_) => writeln!(self.output, "  '{answer}' is not a valid value")?,
            }
        }
    }

    /// Ask for a required, non-blank text value.
    pub fn ask_required(&mut self, label: &str) -> io::Result<Option<String>> {
        loop {
            match self.ask(label)? {
                None => return Ok(None),
                Some(answer) if answer.is_empty() => writeln!(self.output, "  {label} is required")?,
                Some(answer) => return Ok(Some(answer)),
            }
        }
    }

    /// Yes/no question, defaulting to no.
    pub fn confirm(&mut self, question: &str) -> io::Result<bool> {
        let answer = self.ask(&format!("{question} [y/N]"))?;
        Ok(matches!(
            answer.as_deref().map(str::to_ascii_lowercase).as_deref(),
            Some("y" | "yes")
        ))
    }

    pub fn say(&mut self, message: impl Display) -> io::Result<()> {
        writeln!(self.output, "{message}")
    }

    /// The underlying reader, for capture devices sharing the terminal.
    pub fn input_mut(&mut self) -> &mut R {
        &mut self.input
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

/// Creation form for a scanned barcode. `None` if input ends midway.
///
/// `categories` are listed as numbered suggestions; answering with a number
/// picks that category, anything else is taken as typed.
pub fn new_product_form<R: BufRead, W: Write>(
    prompt: &mut Prompt<R, W>,
    barcode: &str,
    categories: &[String],
) -> io::Result<Option<CreateProduct>> {
    prompt.say(format!("New barcode {barcode}"))?;

    let Some(name) = prompt.ask_required("Name")? else {
        return Ok(None);
    };

    if !categories.is_empty() {
        prompt.say("Known categories:")?;
        for (i, category) in categories.iter().enumerate() {
            prompt.say(format!("  {}. {category}", i + 1))?;
        }
    }
    let Some(category) = prompt.ask_required("Category")? else {
        return Ok(None);
    };
    let category = pick_category(categories, category);
    let Some(cost) = prompt.ask_parsed::<f64>("Cost", None)? else {
        return Ok(None);
    };
    let Some(stock) = prompt.ask_parsed::<i64>("Stock", Some(0))? else {
        return Ok(None);
    };
    let Some(min_stock) = prompt.ask_parsed::<i64>("Min stock", Some(DEFAULT_MIN_STOCK))? else {
        return Ok(None);
    };

    Ok(Some(CreateProduct {
        barcode: barcode.to_string(),
        name,
        category,
        cost,
        stock,
        min_stock,
    }))
}

fn pick_category(categories: &[String], answer: String) -> String {
    answer
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| categories.get(i))
        .cloned()
        .unwrap_or(answer)
}

/// Edit form prefilled with the current values. Only changed fields are set.
pub fn edit_product_form<R: BufRead, W: Write>(
    prompt: &mut Prompt<R, W>,
    current: &Product,
) -> io::Result<Option<UpdateProduct>> {
    prompt.say(format!("Editing {} (Enter keeps a value)", current.barcode))?;

    let Some(name) = prompt.ask_parsed("Name", Some(current.name.clone()))? else {
        return Ok(None);
    };
    let Some(category) = prompt.ask_parsed("Category", Some(current.category.clone()))? else {
        return Ok(None);
    };
    let Some(cost) = prompt.ask_parsed("Cost", Some(current.cost))? else {
        return Ok(None);
    };
    let Some(stock) = prompt.ask_parsed("Stock", Some(current.stock))? else {
        return Ok(None);
    };
    let Some(min_stock) = prompt.ask_parsed("Min stock", Some(current.min_stock))? else {
        return Ok(None);
    };

    Ok(Some(UpdateProduct {
        name: (name != current.name).then_some(name),
        category: (category != current.category).then_some(category),
        cost: (cost != current.cost).then_some(cost),
        stock: (stock != current.stock).then_some(stock),
        min_stock: (min_stock != current.min_stock).then_some(min_stock),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::io::Cursor;

    fn prompt(input: &str) -> Prompt<Cursor<Vec<u8>>, Vec<u8>> {
        Prompt::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn test_new_product_form_uses_defaults() {
        let mut p = prompt("Pen\nStationery\nabc\n10\n\n\n");
        let form = new_product_form(&mut p, "123", &[]).unwrap().unwrap();

        assert_eq!(form.barcode, "123");
        assert_eq!(form.name, "Pen");
        assert_eq!(form.cost, 10.0);
        assert_eq!(form.stock, 0);
        assert_eq!(form.min_stock, DEFAULT_MIN_STOCK);

        let transcript = String::from_utf8(p.output).unwrap();
        assert!(transcript.contains("'abc' is not a valid value"));
    }

    #[test]
    fn test_new_product_form_requires_name() {
        let mut p = prompt("\nPen\nStationery\n1\n2\n3\n");
        let form = new_product_form(&mut p, "123", &[]).unwrap().unwrap();
        assert_eq!(form.name, "Pen");
        assert_eq!(form.min_stock, 3);
    }

    #[test]
    fn test_form_aborts_on_end_of_input() {
        let mut p = prompt("Pen\n");
        assert!(new_product_form(&mut p, "123", &[]).unwrap().is_none());
    }

    #[test]
    fn test_new_product_form_offers_known_categories() {
        let known = vec!["Office".to_string(), "Stationery".to_string()];

        let mut p = prompt("Pen\n2\n1\n\n\n");
        let form = new_product_form(&mut p, "123", &known).unwrap().unwrap();
        assert_eq!(form.category, "Stationery");

        let transcript = String::from_utf8(p.output).unwrap();
        assert!(transcript.contains("  1. Office\n"));
        assert!(transcript.contains("  2. Stationery\n"));

        // Out of range numbers and new names are taken as typed
        let mut p = prompt("Pen\n7\n1\n\n\n");
        let form = new_product_form(&mut p, "123", &known).unwrap().unwrap();
        assert_eq!(form.category, "7");

        let mut p = prompt("Pen\nFood\n1\n\n\n");
        let form = new_product_form(&mut p, "123", &known).unwrap().unwrap();
        assert_eq!(form.category, "Food");
    }

    #[test]
    fn test_edit_form_only_sets_changed_fields() {
        let current = Product::new(
            CreateProduct {
                barcode: "123".into(),
                name: "Pen".into(),
                category: "Stationery".into(),
                cost: 10.0,
                stock: 5,
                min_stock: 10,
            },
            Utc::now(),
        );
        let mut p = prompt("Gel Pen\n\n\n\n4\n");
        let changes = edit_product_form(&mut p, &current).unwrap().unwrap();

        assert_eq!(
            changes,
            UpdateProduct {
                name: Some("Gel Pen".into()),
                min_stock: Some(4),
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_confirm() {
        assert!(prompt("y\n").confirm("Delete?").unwrap());
        assert!(prompt("YES\n").confirm("Delete?").unwrap());
        assert!(!prompt("\n").confirm("Delete?").unwrap());
        assert!(!prompt("").confirm("Delete?").unwrap());
    }
}
