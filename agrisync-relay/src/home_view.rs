//! App Home control panel (Block Kit)

use serde_json::{json, Value};

/// Action id of the "start sync" button
pub const START_SYNC_ACTION_ID: &str = "start_scraping_event";

/// Static home tab with a single button that starts a sync run
pub fn home_view() -> Value {
    json!({
        "type": "home",
        "blocks": [
            {
                "type": "header",
                "text": {
                    "type": "plain_text",
                    "text": "🚜 アグリノート・スクレイパー管理パネル"
                }
            },
            {
                "type": "section",
                "text": {
                    "type": "mrkdwn",
                    "text": "ボタンを押すとスクレイピングを開始します。\n結果は完了次第、DMでお知らせします。"
                }
            },
            { "type": "divider" },
            {
                "type": "actions",
                "elements": [
                    {
                        "type": "button",
                        "text": { "type": "plain_text", "text": "🚀 スクレイピング開始" },
                        "style": "primary",
                        "action_id": START_SYNC_ACTION_ID
                    }
                ]
            }
        ]
    })
}
