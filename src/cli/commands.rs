use super::{
    core::{CliMode, CommandError, CommandResult, ShellContext},
    output,
    registry::{CommandEntry, CommandRegistry},
};
use crate::{
    currency::{format_won, parse_amount},
    ledger::{
        transaction::timestamp, Metadata, MetadataValue, Transaction, TransactionKind,
        PAYMENT_METHOD_KEY,
    },
    utils::build_info,
};

const DEFAULT_HISTORY_LIMIT: usize = 20;

pub(crate) fn register_all(registry: &mut CommandRegistry) {
    registry.register(CommandEntry::new(
        "charge",
        "Add funds to the balance",
        "charge <amount> [description] [--ref ID] [--method METHOD] [--meta KEY=VALUE]",
        cmd_charge,
    ));
    registry.register(CommandEntry::new(
        "use",
        "Spend from the balance",
        "use <amount> [description] [--ref ID] [--meta KEY=VALUE]",
        cmd_use,
    ));
    registry.alias("usage", "use");
    registry.register(CommandEntry::new(
        "refund",
        "Return funds to the balance",
        "refund <amount> [description] [--ref ID] [--meta KEY=VALUE]",
        cmd_refund,
    ));
    registry.register(CommandEntry::new(
        "penalty",
        "Deduct a penalty from the balance",
        "penalty <amount> [description] [--ref ID] [--meta KEY=VALUE]",
        cmd_penalty,
    ));
    registry.register(CommandEntry::new(
        "balance",
        "Show the current balance and last charge",
        "balance",
        cmd_balance,
    ));
    registry.register(CommandEntry::new(
        "history",
        "List transactions, newest first",
        "history [limit] [offset] [--kind charge|usage|refund|penalty]",
        cmd_history,
    ));
    registry.register(CommandEntry::new(
        "reset",
        "Delete every transaction and the stored ledger",
        "reset --yes",
        cmd_reset,
    ));
    registry.register(CommandEntry::new(
        "version",
        "Show build information",
        "version",
        cmd_version,
    ));
    registry.register(CommandEntry::new(
        "help",
        "List commands or show usage for one",
        "help [command]",
        cmd_help,
    ));
    registry.register(CommandEntry::new(
        "exit",
        "Leave the shell",
        "exit",
        cmd_exit,
    ));
    registry.alias("quit", "exit");
}

/// Parsed arguments shared by the four recording commands.
#[derive(Debug, Default, PartialEq)]
struct RecordArgs {
    amount: f64,
    description: Option<String>,
    reference_id: Option<String>,
    metadata: Metadata,
}

fn parse_record_args(args: &[&str]) -> Result<RecordArgs, CommandError> {
    let (raw_amount, rest) = args
        .split_first()
        .ok_or_else(|| CommandError::InvalidArguments("An amount is required.".into()))?;
    let amount = parse_amount(raw_amount).ok_or_else(|| {
        CommandError::InvalidArguments(format!("`{raw_amount}` is not a number."))
    })?;

    let mut parsed = RecordArgs {
        amount,
        ..RecordArgs::default()
    };
    let mut words = Vec::new();
    let mut iter = rest.iter();
    while let Some(token) = iter.next() {
        match *token {
            "--ref" => parsed.reference_id = Some(flag_value(&mut iter, "--ref")?.to_string()),
            "--method" => {
                let method = flag_value(&mut iter, "--method")?;
                parsed
                    .metadata
                    .insert(PAYMENT_METHOD_KEY.into(), MetadataValue::from(method));
            }
            "--meta" => {
                let pair = flag_value(&mut iter, "--meta")?;
                let (key, value) = pair.split_once('=').ok_or_else(|| {
                    CommandError::InvalidArguments(format!("`{pair}` is not KEY=VALUE."))
                })?;
                parsed
                    .metadata
                    .insert(key.trim().to_string(), parse_meta_value(value.trim()));
            }
            word => words.push(word),
        }
    }
    if !words.is_empty() {
        parsed.description = Some(words.join(" "));
    }
    Ok(parsed)
}

fn flag_value<'a>(
    iter: &mut std::slice::Iter<'_, &'a str>,
    flag: &str,
) -> Result<&'a str, CommandError> {
    iter.next()
        .copied()
        .ok_or_else(|| CommandError::InvalidArguments(format!("`{flag}` needs a value.")))
}

fn parse_meta_value(raw: &str) -> MetadataValue {
    if let Ok(flag) = raw.parse::<bool>() {
        return MetadataValue::Bool(flag);
    }
    if let Ok(number) = raw.parse::<i64>() {
        return MetadataValue::Integer(number);
    }
    match raw.parse::<f64>() {
        Ok(number) if number.is_finite() => MetadataValue::Float(number),
        _ => MetadataValue::Text(raw.to_string()),
    }
}

fn record(context: &mut ShellContext, kind: TransactionKind, args: &[&str]) -> CommandResult {
    let parsed = parse_record_args(args)?;
    let description = parsed
        .description
        .unwrap_or_else(|| default_description(kind).to_string());
    let metadata = if parsed.metadata.is_empty() {
        None
    } else {
        Some(parsed.metadata)
    };
    let txn = context.ledger.record_transaction(
        kind,
        parsed.amount,
        description,
        parsed.reference_id,
        metadata,
    )?;
    output::success(format!(
        "{} {} recorded ({}). Balance: {}",
        kind,
        format_won(txn.amount),
        txn.id,
        format_won(txn.balance)
    ));
    Ok(())
}

fn default_description(kind: TransactionKind) -> &'static str {
    match kind {
        TransactionKind::Charge => "충전",
        TransactionKind::Usage => "사용",
        TransactionKind::Refund => "환불",
        TransactionKind::Penalty => "차감",
    }
}

fn cmd_charge(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    record(context, TransactionKind::Charge, args)
}

fn cmd_use(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    record(context, TransactionKind::Usage, args)
}

fn cmd_refund(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    record(context, TransactionKind::Refund, args)
}

fn cmd_penalty(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    record(context, TransactionKind::Penalty, args)
}

fn cmd_balance(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let ledger = &context.ledger;
    output::info(format!("Balance: {}", format_won(ledger.current_balance())));
    match ledger.last_charge() {
        Some(charge) => output::info(format!(
            "Last charge: {} on {} via {}",
            format_won(charge.amount),
            timestamp::format(&charge.date),
            ledger.payment_method()
        )),
        None => output::info("No charges yet."),
    }
    Ok(())
}

fn parse_index(raw: Option<&&str>, name: &str, default: usize) -> Result<usize, CommandError> {
    match raw {
        Some(value) => value.parse::<usize>().map_err(|_| {
            CommandError::InvalidArguments(format!("{name} must be a non-negative integer."))
        }),
        None => Ok(default),
    }
}

/// Positional `limit`/`offset` plus an optional `--kind` filter.
fn parse_history_args(
    args: &[&str],
) -> Result<(usize, usize, Option<TransactionKind>), CommandError> {
    let mut positional = Vec::new();
    let mut kind = None;
    let mut iter = args.iter();
    while let Some(token) = iter.next() {
        match *token {
            "--kind" => {
                let raw = flag_value(&mut iter, "--kind")?;
                kind = Some(
                    raw.parse::<TransactionKind>()
                        .map_err(CommandError::InvalidArguments)?,
                );
            }
            value => positional.push(value),
        }
    }
    let limit = parse_index(positional.first(), "limit", DEFAULT_HISTORY_LIMIT)?;
    let offset = parse_index(positional.get(1), "offset", 0)?;
    if limit == 0 {
        return Err(CommandError::InvalidArguments(
            "limit must be at least 1.".into(),
        ));
    }
    Ok((limit, offset, kind))
}

fn cmd_history(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (limit, offset, kind) = parse_history_args(args)?;
    let page = context.ledger.history_page_of(kind, limit, offset);

    output::section("History");
    if page.transactions.is_empty() {
        output::info("No transactions.");
        return Ok(());
    }
    for txn in &page.transactions {
        output::line(history_row(txn));
    }
    output::info(format!(
        "Showing {}-{} of {}",
        offset + 1,
        offset + page.transactions.len(),
        page.total
    ));
    if page.has_more() {
        let filter = kind.map(|kind| format!(" --kind {kind}")).unwrap_or_default();
        output::hint(format!(
            "More with `history {} {}{}`.",
            limit,
            offset + page.transactions.len(),
            filter
        ));
    }
    Ok(())
}

fn history_row(txn: &Transaction) -> String {
    let mut row = format!(
        "{}  {:<7} {:>14}  {:>14}  {}",
        timestamp::format(&txn.timestamp),
        txn.kind.as_str(),
        format_won(txn.amount),
        format_won(txn.balance),
        txn.description
    );
    if let Some(reference) = &txn.reference_id {
        row.push_str(&format!("  [ref {reference}]"));
    }
    row
}

fn cmd_reset(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if !args.contains(&"--yes") {
        output::warning("This deletes every transaction. Re-run as `reset --yes` to confirm.");
        return Ok(());
    }
    context.ledger.reset()?;
    output::success("Ledger cleared.");
    Ok(())
}

fn cmd_version(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    output::info(build_info::current().summary());
    Ok(())
}

fn cmd_help(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if let Some(name) = args.first() {
        let entry = context.command(&name.to_lowercase()).ok_or_else(|| {
            CommandError::InvalidArguments(format!("No command named `{name}`."))
        })?;
        output::info(format!("{}: {}", entry.name, entry.description));
        output::line(format!("  usage: {}", entry.usage));
        return Ok(());
    }
    output::section("Commands");
    for entry in context.commands() {
        output::line(format!("  {:<8} {}", entry.name, entry.description));
    }
    if context.mode == CliMode::Interactive {
        output::hint("Press Tab or ? to complete command names.");
    }
    Ok(())
}

fn cmd_exit(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    Err(CommandError::ExitRequested)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_args_split_description_and_flags() {
        let parsed = parse_record_args(&[
            "50,000",
            "spring",
            "campaign",
            "--ref",
            "pay_9",
            "--method",
            "bank",
            "--meta",
            "isReward=false",
        ])
        .expect("parse");
        assert_eq!(parsed.amount, 50_000.0);
        assert_eq!(parsed.description.as_deref(), Some("spring campaign"));
        assert_eq!(parsed.reference_id.as_deref(), Some("pay_9"));
        assert_eq!(
            parsed.metadata.get(PAYMENT_METHOD_KEY),
            Some(&MetadataValue::Text("bank".into()))
        );
        assert_eq!(
            parsed.metadata.get("isReward"),
            Some(&MetadataValue::Bool(false))
        );
    }

    #[test]
    fn record_args_require_amount_and_flag_values() {
        assert!(matches!(
            parse_record_args(&[]),
            Err(CommandError::InvalidArguments(_))
        ));
        assert!(matches!(
            parse_record_args(&["ten"]),
            Err(CommandError::InvalidArguments(_))
        ));
        assert!(matches!(
            parse_record_args(&["10", "--ref"]),
            Err(CommandError::InvalidArguments(_))
        ));
    }

    #[test]
    fn history_args_accept_a_kind_filter_anywhere() {
        assert_eq!(
            parse_history_args(&["5", "--kind", "use", "10"]).expect("parse"),
            (5, 10, Some(TransactionKind::Usage))
        );
        assert_eq!(
            parse_history_args(&[]).expect("parse"),
            (DEFAULT_HISTORY_LIMIT, 0, None)
        );
        match parse_history_args(&["--kind", "points"]) {
            Err(CommandError::InvalidArguments(message)) => {
                assert!(message.contains("unknown transaction type `points`"))
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            parse_history_args(&["0"]),
            Err(CommandError::InvalidArguments(_))
        ));
    }

    #[test]
    fn meta_values_pick_the_narrowest_type() {
        assert_eq!(parse_meta_value("true"), MetadataValue::Bool(true));
        assert_eq!(parse_meta_value("42"), MetadataValue::Integer(42));
        assert_eq!(parse_meta_value("0.5"), MetadataValue::Float(0.5));
        assert_eq!(parse_meta_value("point"), MetadataValue::Text("point".into()));
        assert_eq!(parse_meta_value("NaN"), MetadataValue::Text("NaN".into()));
    }
}
