//! 持久化数据：个人资料、成功投递记录、平台

use serde::{Deserialize, Serialize};
use url::Url;

/// 个人资料（存储键 `userData`）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserData {
    pub name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub current_title: Option<String>,
    pub current_company: Option<String>,
    pub years_of_experience: Option<String>,
    pub experience: Option<String>,
    pub education: Option<String>,
    pub linkedin: Option<String>,
    pub website: Option<String>,
    pub github: Option<String>,
    pub salary_expectation: Option<String>,
    pub notice_period: Option<String>,
}

impl UserData {
    /// 按存储里的键名取值，空字符串视为没有
    pub fn get(&self, key: &str) -> Option<&str> {
        let value = match key {
            "name" => &self.name,
            "firstName" => &self.first_name,
            "lastName" => &self.last_name,
            "email" => &self.email,
            "phone" => &self.phone,
            "location" => &self.location,
            "currentTitle" => &self.current_title,
            "currentCompany" => &self.current_company,
            "yearsOfExperience" => &self.years_of_experience,
            "experience" => &self.experience,
            "education" => &self.education,
            "linkedin" => &self.linkedin,
            "website" => &self.website,
            "github" => &self.github,
            "salaryExpectation" => &self.salary_expectation,
            "noticePeriod" => &self.notice_period,
            _ => return None,
        };
        value.as_deref().filter(|v| !v.is_empty())
    }
}

/// 一条成功投递记录（存储键 `successfulApps`）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessfulApp {
    pub company: String,
    pub position: String,
    pub location: String,
    /// ISO-8601
    pub date: String,
    pub platform: Option<Platform>,
}

/// 识别出的招聘平台
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Linkedin,
    Indeed,
}

impl Platform {
    /// 从当前页面地址识别平台
    pub fn detect(page_url: &str) -> Option<Self> {
        let url = Url::parse(page_url).ok()?;
        let host = url.host_str()?;
        if host.contains("linkedin.com") {
            Some(Platform::Linkedin)
        } else if host.contains("indeed.com") {
            Some(Platform::Indeed)
        } else {
            None
        }
    }

    /// 是否为完整支持自动投递的平台
    pub fn is_supported(self) -> bool {
        self == Platform::Linkedin
    }
}

/// 页面路径是否为职位页
pub fn is_jobs_page(page_url: &str) -> bool {
    Url::parse(page_url)
        .map(|url| {
            let path = url.path();
            path.contains("/jobs/") || path.contains("/job/")
        })
        .unwrap_or(false)
}
