//! 业务逻辑服务模块
//!
//! 数据获取、清洗、计算、渲染和输出

pub mod chart;        // 走势图
pub mod common;       // HTTP 客户端和公共工具
pub mod ladder;       // 行权价阶梯
pub mod open_interest; // 先物建玉提取
pub mod output;       // 原子写文件
pub mod pipeline;     // 流程编排
pub mod price;        // 指数价格获取
pub mod range;        // 预测区间
pub mod render;       // HTML 片段渲染
pub mod sanitize;     // 数值清洗
pub mod sources;      // 外部数据源
pub mod volatility;   // 波动率指数获取
