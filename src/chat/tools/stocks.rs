//! Demo stock tools: fixed-latency cards over validated arguments.
//!
//! None of these hit a real market feed; they render the model-supplied
//! data after a simulated delay. The purchase tool carries the one hard
//! validation rule in the system: the share count must be in (0, 1000].

use anyhow::Result;
use serde_json::json;
use tokio::time::sleep;

use super::{GetEventsArgs, ListStocksArgs, StockPriceArgs, StockPurchaseArgs, ToolContext};
use crate::chat::render::{Display, PurchaseStatus};
use crate::chat::types::Message;

/// Upper bound on shares per purchase.
const MAX_SHARES: f64 = 1000.0;

pub(super) async fn list_stocks(ctx: &ToolContext, args: ListStocksArgs) -> Result<()> {
    ctx.ui.send(Display::StocksSkeleton);
    sleep(ctx.pacing.card_delay).await;

    ctx.finish_with_exchange(
        "listStocks",
        json!({ "stocks": &args.stocks }),
        serde_json::to_value(&args.stocks)?,
        None,
    )
    .await;

    ctx.ui.send(Display::Stocks {
        stocks: args.stocks,
    });
    Ok(())
}

pub(super) async fn show_stock_price(ctx: &ToolContext, args: StockPriceArgs) -> Result<()> {
    ctx.ui.send(Display::StockSkeleton);
    sleep(ctx.pacing.card_delay).await;

    let record = json!({
        "symbol": &args.symbol,
        "price": args.price,
        "delta": args.delta,
    });
    ctx.finish_with_exchange("showStockPrice", record.clone(), record, None)
        .await;

    ctx.ui.send(Display::StockPrice {
        symbol: args.symbol,
        price: args.price,
        delta: args.delta,
    });
    Ok(())
}

pub(super) async fn show_stock_purchase(ctx: &ToolContext, args: StockPurchaseArgs) -> Result<()> {
    let shares = args.number_of_shares;
    let call_args = json!({
        "symbol": &args.symbol,
        "price": args.price,
        "numberOfShares": shares,
    });

    if shares <= 0.0 || shares > MAX_SHARES {
        let result = json!({
            "symbol": &args.symbol,
            "price": args.price,
            "numberOfShares": shares,
            "status": "expired",
        });
        ctx.finish_with_exchange(
            "showStockPurchase",
            call_args,
            result,
            Some(Message::system("[User has selected an invalid amount]")),
        )
        .await;

        ctx.ui.send(Display::BotMessage {
            text: "Invalid amount".to_string(),
        });
        return Ok(());
    }

    let result = json!({
        "symbol": &args.symbol,
        "price": args.price,
        "numberOfShares": shares,
        "status": "requires_action",
    });
    ctx.finish_with_exchange("showStockPurchase", call_args, result, None)
        .await;

    ctx.ui.send(Display::StockPurchase {
        symbol: args.symbol,
        price: args.price,
        number_of_shares: shares,
        status: PurchaseStatus::RequiresAction,
    });
    Ok(())
}

pub(super) async fn get_events(ctx: &ToolContext, args: GetEventsArgs) -> Result<()> {
    ctx.ui.send(Display::EventsSkeleton);
    sleep(ctx.pacing.card_delay).await;

    ctx.finish_with_exchange(
        "getEvents",
        json!({ "events": &args.events }),
        serde_json::to_value(&args.events)?,
        None,
    )
    .await;

    ctx.ui.send(Display::Events {
        events: args.events,
    });
    Ok(())
}
