//! 日经平均行情快照
//!
//! 获取指数价格、波动率指数和先物建玉，计算预测区间和行权价阶梯，
//! 生成走势图和 HTML 片段。每次运行都会完整覆盖上一次的输出
//! 数据来源：Yahoo Finance、Stooq、JPX

mod config;   // 配置
mod models;   // 数据模型定义
mod services; // 业务逻辑服务

use env_logger::Env;

use crate::config::AppConfig;
use crate::services::pipeline::HttpPipeline;

/// 应用程序入口
///
/// 数据源失败只会降级，只有输出文件写不出来才以错误退出
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (config, config_messages) = AppConfig::load();

    // 初始化日志系统，RUST_LOG 优先于配置文件中的级别
    env_logger::init_from_env(Env::default().default_filter_or(config.log.level.as_str()));
    for message in &config_messages {
        log::info!("{}", message);
    }

    log::info!("开始生成行情快照");

    let pipeline = HttpPipeline::from_config(config)?;
    let status = pipeline.run().await?;

    for component in status.components.iter().filter(|c| !c.status.is_fresh()) {
        log::warn!("⚠️ {} 状态: {:?}", component.component, component.status);
    }
    log::info!(
        "✅ 完成: {} (输出 {}, {}, 图表 {})",
        status.message,
        pipeline.config().output.headline_path,
        pipeline.config().output.detail_path,
        pipeline.config().chart.path
    );

    Ok(())
}
