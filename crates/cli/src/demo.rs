//! Built-in demo commands for the console session.

use parley_core::{ArgumentBinding, CommandContext, HandlerResult, OutboundMessage, Registration};
use parley_i18n::keys;
use parley_spec::{CommandDeclaration, SpecError};

/// `help`, `ping`, `echo` and `purge`, in listing order.
pub(crate) fn registrations() -> Result<Vec<Registration>, SpecError> {
    Ok(vec![
        Registration::declare(
            CommandDeclaration::new("help")
                .alias("commands")
                .description("command.help.description"),
            help,
        )?,
        Registration::declare(
            CommandDeclaration::new("ping").description("command.ping.description"),
            ping,
        )?,
        Registration::declare(
            CommandDeclaration::new("echo")
                .alias("say")
                .params("<text...>")
                .description("command.echo.description"),
            echo,
        )?,
        Registration::declare(
            CommandDeclaration::new("purge")
                .params("<count> [reason...]")
                .description("command.purge.description")
                .permission("manage_messages"),
            purge,
        )?,
    ])
}

async fn help(ctx: CommandContext, _args: ArgumentBinding) -> HandlerResult {
    let mut body = String::new();
    for entry in ctx.applicable_commands().await {
        body.push_str(&ctx.usage_line(entry.spec()));
        body.push('\n');
    }
    body.push('\n');
    body.push_str(&ctx.render(keys::HELP_DISCLAIMER_USER, &[]));
    body.push('\n');
    body.push_str(&ctx.render(keys::HELP_DISCLAIMER_HELP, &[ctx.prefix()]));

    let title = ctx.render(keys::HELP_TITLE, &[]);
    ctx.reply(OutboundMessage::info(title, body)).await?;
    Ok(())
}

async fn ping(ctx: CommandContext, _args: ArgumentBinding) -> HandlerResult {
    let text = ctx.render("command.ping.completed", &[]);
    ctx.reply(OutboundMessage::text(text)).await?;
    Ok(())
}

async fn echo(ctx: CommandContext, args: ArgumentBinding) -> HandlerResult {
    let text = args.get("text").unwrap_or_default().to_string();
    ctx.reply(OutboundMessage::text(text)).await?;
    Ok(())
}

async fn purge(ctx: CommandContext, args: ArgumentBinding) -> HandlerResult {
    let raw = args.get("count").unwrap_or_default();
    let count = match raw.parse::<u32>() {
        Ok(n) if n > 0 => n.to_string(),
        _ => {
            let text = ctx.render("command.purge.incorrect-number", &[raw]);
            ctx.reply(OutboundMessage::error(text)).await?;
            return Ok(());
        }
    };
    let text = match args.get("reason") {
        Some(reason) => ctx.render("command.purge.completed.reason", &[count.as_str(), reason]),
        None => ctx.render("command.purge.completed", &[count.as_str()]),
    };
    ctx.reply(OutboundMessage::text(text)).await?;
    Ok(())
}
